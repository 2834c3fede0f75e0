//! Streaming CRC-32 over four carry-less-multiply lanes.
//!
//! A [`FoldState`] holds four 128-bit lanes plus the lane used to merge a
//! sub-16-byte block. Data is folded in 64-byte strides; a tail shorter than
//! a full block is shifted into the lanes with a `pshufb` mask so the state
//! can be resumed at any byte offset. [`fold_finalize`] reduces the lanes to
//! the 32-bit CRC without consuming the state.
//!
//! The folding routines exist only on `x86_64`. The state type is portable so
//! that stream code can hold an `Option<FoldState>` on every target.

/// Lane-0 seed that stands for the standard all-ones CRC register.
const INIT_LANE0: u32 = 0x9db4_2487;

/// In-flight folding CRC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoldState {
    lanes: [[u8; 16]; 4],
    partial: [u8; 16],
}

impl FoldState {
    /// A state positioned at the start of a stream.
    #[must_use]
    pub fn new() -> Self {
        let mut state = Self { lanes: [[0u8; 16]; 4], partial: [0u8; 16] };
        fold_init(&mut state);
        state
    }
}

impl Default for FoldState {
    fn default() -> Self {
        Self::new()
    }
}

/// Reset `state` to the start of a stream.
pub fn fold_init(state: &mut FoldState) {
    state.lanes = [[0u8; 16]; 4];
    state.lanes[0][..4].copy_from_slice(&INIT_LANE0.to_le_bytes());
    state.partial = [0u8; 16];
}

#[cfg(target_arch = "x86_64")]
pub use self::x86::{fold, fold_copy, fold_finalize};

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::{
        __m128i, _mm_and_si128, _mm_clmulepi64_si128, _mm_extract_epi32, _mm_loadu_si128, _mm_or_si128,
        _mm_set1_epi8, _mm_setr_epi32, _mm_setzero_si128, _mm_shuffle_epi8, _mm_slli_si128, _mm_srli_si128,
        _mm_storeu_si128, _mm_xor_si128,
    };

    use super::FoldState;

    /// `pshufb` masks that shift a lane left by `len` bytes, one per `len` in 1..16.
    /// Setting bit 7 of every byte turns a mask into the complementary right shift.
    const SHIFT_TABLE: [[u8; 16]; 15] = shift_table();

    const fn shift_table() -> [[u8; 16]; 15] {
        let mut table = [[0u8; 16]; 15];
        let mut len = 1;
        while len < 16 {
            let mut i = 0;
            while i < 16 {
                let idx = ((i + len) & 15) as u8;
                table[len - 1][i] = if i < 16 - len { idx | 0x80 } else { idx };
                i += 1;
            }
            len += 1;
        }
        table
    }

    struct Lanes {
        crc: [__m128i; 4],
        part: __m128i,
    }

    impl Lanes {
        #[inline(always)]
        unsafe fn load(state: &FoldState) -> Self {
            Self {
                crc: [
                    load16(&state.lanes[0]),
                    load16(&state.lanes[1]),
                    load16(&state.lanes[2]),
                    load16(&state.lanes[3]),
                ],
                part: load16(&state.partial),
            }
        }

        #[inline(always)]
        unsafe fn save(&self, state: &mut FoldState) {
            for (dst, lane) in state.lanes.iter_mut().zip(self.crc) {
                store16(dst, lane);
            }
            store16(&mut state.partial, self.part);
        }
    }

    #[inline(always)]
    unsafe fn setr(e: [u32; 4]) -> __m128i {
        _mm_setr_epi32(e[0] as i32, e[1] as i32, e[2] as i32, e[3] as i32)
    }

    #[inline(always)]
    unsafe fn load16(src: &[u8]) -> __m128i {
        let src = &src[..16];
        _mm_loadu_si128(src.as_ptr().cast())
    }

    /// Load fewer than 16 bytes without reading past the slice.
    #[inline(always)]
    unsafe fn load_partial(src: &[u8]) -> __m128i {
        let mut buf = [0u8; 16];
        buf[..src.len()].copy_from_slice(src);
        _mm_loadu_si128(buf.as_ptr().cast())
    }

    #[inline(always)]
    unsafe fn store16(dst: &mut [u8], v: __m128i) {
        let dst = &mut dst[..16];
        _mm_storeu_si128(dst.as_mut_ptr().cast(), v);
    }

    #[inline(always)]
    unsafe fn fold4_constant() -> __m128i {
        setr([0xc6e4_1596, 0x0000_0001, 0x5444_2bd4, 0x0000_0001])
    }

    /// Advance one lane by 512 bits.
    #[inline(always)]
    unsafe fn fold_step(x: __m128i) -> __m128i {
        let k = fold4_constant();
        _mm_xor_si128(_mm_clmulepi64_si128(x, k, 0x01), _mm_clmulepi64_si128(x, k, 0x10))
    }

    /// Rotate `N` lanes out of the front, folding each into a freed slot at the back.
    #[inline(always)]
    unsafe fn fold_lanes<const N: usize>(crc: &mut [__m128i; 4]) {
        let old = *crc;
        for i in 0..4 {
            crc[i] = if i + N < 4 { old[i + N] } else { fold_step(old[i + N - 4]) };
        }
    }

    /// Fold `N` full blocks at `src[pos..]`, mirroring them to `dst` when copying.
    #[inline(always)]
    unsafe fn fold_blocks<const N: usize, const COPY: bool>(lanes: &mut Lanes, dst: &mut [u8], src: &[u8], pos: usize) {
        let mut data = [_mm_setzero_si128(); N];
        for (i, block) in data.iter_mut().enumerate() {
            *block = load16(&src[pos + 16 * i..]);
            if COPY {
                store16(&mut dst[pos + 16 * i..], *block);
            }
        }
        fold_lanes::<N>(&mut lanes.crc);
        for (i, block) in data.into_iter().enumerate() {
            lanes.crc[4 - N + i] = _mm_xor_si128(lanes.crc[4 - N + i], block);
        }
    }

    /// Shift the whole lane stream left by `len` bytes, pulling the first `len`
    /// bytes of `lanes.part` in at the back.
    #[inline(always)]
    unsafe fn partial_fold(len: usize, lanes: &mut Lanes) {
        debug_assert!((1..16).contains(&len));
        let k = fold4_constant();
        let shl = load16(&SHIFT_TABLE[len - 1]);
        let shr = _mm_xor_si128(shl, _mm_set1_epi8(0x80u8 as i8));
        let [c0, c1, c2, c3] = lanes.crc;

        let spill = _mm_shuffle_epi8(c0, shl);
        lanes.crc[0] = _mm_or_si128(_mm_shuffle_epi8(c0, shr), _mm_shuffle_epi8(c1, shl));
        lanes.crc[1] = _mm_or_si128(_mm_shuffle_epi8(c1, shr), _mm_shuffle_epi8(c2, shl));
        lanes.crc[2] = _mm_or_si128(_mm_shuffle_epi8(c2, shr), _mm_shuffle_epi8(c3, shl));
        let c3 = _mm_or_si128(_mm_shuffle_epi8(c3, shr), _mm_shuffle_epi8(lanes.part, shl));

        let folded = _mm_xor_si128(_mm_clmulepi64_si128(spill, k, 0x10), _mm_clmulepi64_si128(spill, k, 0x01));
        lanes.crc[3] = _mm_xor_si128(c3, folded);
    }

    #[inline(always)]
    unsafe fn fold_impl<const COPY: bool>(state: &mut FoldState, dst: &mut [u8], src: &[u8]) {
        let len = src.len();
        if len == 0 {
            return;
        }
        let mut lanes = Lanes::load(state);
        let mut pos = 0;

        if len >= 16 {
            // Line the main loop up on a 16-byte boundary.
            let align = (src.as_ptr() as usize).wrapping_neg() & 15;
            if align != 0 {
                lanes.part = load16(src);
                if COPY {
                    dst[..align].copy_from_slice(&src[..align]);
                }
                partial_fold(align, &mut lanes);
                pos = align;
            }

            while len - pos >= 64 {
                fold_blocks::<4, COPY>(&mut lanes, dst, src, pos);
                pos += 64;
            }

            let blocks = (len - pos) / 16;
            match blocks {
                3 => fold_blocks::<3, COPY>(&mut lanes, dst, src, pos),
                2 => fold_blocks::<2, COPY>(&mut lanes, dst, src, pos),
                1 => fold_blocks::<1, COPY>(&mut lanes, dst, src, pos),
                _ => {}
            }
            pos += blocks * 16;
        }

        if pos < len {
            let rest = &src[pos..];
            lanes.part = load_partial(rest);
            if COPY {
                dst[pos..len].copy_from_slice(rest);
            }
            partial_fold(rest.len(), &mut lanes);
        }

        lanes.save(state);
    }

    /// Fold `src` into `state`.
    ///
    /// # Safety
    ///
    /// Caller must ensure the CPU supports PCLMULQDQ, SSSE3 and SSE4.1.
    #[target_feature(enable = "pclmulqdq,ssse3,sse4.1")]
    pub unsafe fn fold(state: &mut FoldState, src: &[u8]) {
        fold_impl::<false>(state, &mut [], src);
    }

    /// Fold `src` into `state` while copying it to the front of `dst`.
    ///
    /// Panics if `dst` is shorter than `src`.
    ///
    /// # Safety
    ///
    /// Caller must ensure the CPU supports PCLMULQDQ, SSSE3 and SSE4.1.
    #[target_feature(enable = "pclmulqdq,ssse3,sse4.1")]
    pub unsafe fn fold_copy(state: &mut FoldState, dst: &mut [u8], src: &[u8]) {
        let dst = &mut dst[..src.len()];
        fold_impl::<true>(state, dst, src);
    }

    /// Reduce the lanes to the CRC-32 of everything folded so far.
    ///
    /// # Safety
    ///
    /// Caller must ensure the CPU supports PCLMULQDQ, SSSE3 and SSE4.1.
    #[target_feature(enable = "pclmulqdq,ssse3,sse4.1")]
    pub unsafe fn fold_finalize(state: &FoldState) -> u32 {
        #[inline(always)]
        unsafe fn fold_into(from: __m128i, into: __m128i, k: __m128i) -> __m128i {
            let hi = _mm_clmulepi64_si128(from, k, 0x10);
            let lo = _mm_clmulepi64_si128(from, k, 0x01);
            _mm_xor_si128(_mm_xor_si128(into, hi), lo)
        }

        let mask = setr([0xffff_ffff, 0xffff_ffff, 0, 0]);
        let mask2 = setr([0, 0xffff_ffff, 0xffff_ffff, 0xffff_ffff]);
        let [c0, c1, c2, c3] = Lanes::load(state).crc;

        // 512 -> 128
        let k = setr([0xccaa_009e, 0, 0x7519_97d0, 1]);
        let c1 = fold_into(c0, c1, k);
        let c2 = fold_into(c1, c2, k);
        let c3 = fold_into(c2, c3, k);

        // 128 -> 64
        let k = setr([0xccaa_009e, 0, 0x63cd_6124, 1]);
        let x = _mm_xor_si128(_mm_clmulepi64_si128(c3, k, 0x00), _mm_srli_si128(c3, 8));

        // 64 -> 32
        let x = _mm_xor_si128(_mm_clmulepi64_si128(_mm_slli_si128(x, 4), k, 0x10), x);
        let x = _mm_and_si128(x, mask2);

        // Barrett reduction
        let k = setr([0xf701_1640, 1, 0xdb71_0640, 1]);
        let t = _mm_and_si128(_mm_xor_si128(_mm_clmulepi64_si128(x, k, 0x00), x), mask);
        let r = _mm_xor_si128(_mm_xor_si128(_mm_clmulepi64_si128(t, k, 0x10), t), x);

        !(_mm_extract_epi32(r, 2) as u32)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_seeds_lane_zero() {
        let state = FoldState::new();
        assert_eq!(&state.lanes[0][..4], &INIT_LANE0.to_le_bytes());
        assert!(state.lanes[1..].iter().all(|lane| lane.iter().all(|&b| b == 0)));
        assert_eq!(state, FoldState::default());
    }

    #[cfg(target_arch = "x86_64")]
    fn can_fold() -> bool {
        crate::simd::detect().can_fold()
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_empty_stream_finalizes_to_zero() {
        if !can_fold() {
            return;
        }
        // SAFETY: folding support checked above.
        assert_eq!(unsafe { fold_finalize(&FoldState::new()) }, 0);
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_fold_matches_generic_every_length_and_offset() {
        if !can_fold() {
            return;
        }
        let data: Vec<u8> = (0..400u32).map(|i| (i.wrapping_mul(0x9e37_79b9) >> 24) as u8).collect();
        for offset in 0..16 {
            for len in (0..260).chain([300, 384]) {
                let slice = &data[offset..offset + len];
                let mut state = FoldState::new();
                // SAFETY: folding support checked above.
                let got = unsafe {
                    fold(&mut state, slice);
                    fold_finalize(&state)
                };
                assert_eq!(got, crate::crc32::crc32_generic(0, slice), "offset={offset} len={len}");
            }
        }
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_fold_streaming_pieces() {
        if !can_fold() {
            return;
        }
        let data: Vec<u8> = (0..777u32).map(|i| (i * 7 ^ i >> 3) as u8).collect();
        let mut state = FoldState::new();
        let mut pos = 0;
        for step in [3, 20, 64, 5, 100, 1, 300, 284] {
            // SAFETY: folding support checked above.
            unsafe { fold(&mut state, &data[pos..pos + step]) };
            pos += step;
        }
        assert_eq!(pos, data.len());
        // SAFETY: folding support checked above.
        assert_eq!(unsafe { fold_finalize(&state) }, crate::crc32::crc32_generic(0, &data));
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_fold_copy_copies_and_checksums() {
        if !can_fold() {
            return;
        }
        let src: Vec<u8> = (0..250u32).map(|i| (i * 3 + 1) as u8).collect();
        for len in [0, 1, 15, 16, 17, 63, 64, 65, 129, 250] {
            let mut dst = vec![0xEEu8; 260];
            let mut state = FoldState::new();
            // SAFETY: folding support checked above.
            let crc = unsafe {
                fold_copy(&mut state, &mut dst, &src[..len]);
                fold_finalize(&state)
            };
            assert_eq!(&dst[..len], &src[..len]);
            assert!(dst[len..].iter().all(|&b| b == 0xEE), "len={len}");
            assert_eq!(crc, crate::crc32::crc32_generic(0, &src[..len]));
        }
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn test_finalize_does_not_consume() {
        if !can_fold() {
            return;
        }
        let mut state = FoldState::new();
        // SAFETY: folding support checked above.
        unsafe {
            fold(&mut state, b"123456789");
            assert_eq!(fold_finalize(&state), 0xcbf4_3926);
            fold(&mut state, b"abc");
            assert_eq!(fold_finalize(&state), crate::crc32::crc32_generic(0, b"123456789abc"));
        }
    }
}
