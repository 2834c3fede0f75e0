//! One-shot CRC-32 with four parallel carry-less-multiply accumulators.
//!
//! Intel, "Fast CRC Computation for Generic Polynomials Using PCLMULQDQ
//! Instruction". Requires at least 64 bytes and a length that is a multiple
//! of 16; the dispatcher feeds it the bulk of a buffer and finishes the tail
//! with the table engine.

use std::arch::x86_64::{
    __m128i, _mm_and_si128, _mm_clmulepi64_si128, _mm_cvtsi32_si128, _mm_extract_epi32, _mm_loadu_si128,
    _mm_set_epi64x, _mm_setr_epi32, _mm_srli_si128, _mm_xor_si128,
};

/// Shortest input accepted by [`crc32_pclmul`].
pub const MIN_LEN: usize = 64;

#[inline(always)]
unsafe fn load16(src: &[u8]) -> __m128i {
    let src = &src[..16];
    _mm_loadu_si128(src.as_ptr().cast())
}

/// Multiply both halves of `x` by their fold constants and add `data`.
#[inline(always)]
unsafe fn fold_wide(x: __m128i, k: __m128i, data: __m128i) -> __m128i {
    let lo = _mm_clmulepi64_si128(x, k, 0x00);
    let hi = _mm_clmulepi64_si128(x, k, 0x11);
    _mm_xor_si128(_mm_xor_si128(hi, lo), data)
}

/// CRC-32 of `buf` continuing from `crc`.
///
/// Panics unless `buf.len() >= 64` and `buf.len() % 16 == 0`.
///
/// # Safety
///
/// Caller must ensure the CPU supports PCLMULQDQ, SSSE3 and SSE4.1.
#[target_feature(enable = "pclmulqdq,ssse3,sse4.1")]
pub unsafe fn crc32_pclmul(crc: u32, buf: &[u8]) -> u32 {
    assert!(
        buf.len() >= MIN_LEN && buf.len() % 16 == 0,
        "one-shot CRC needs a multiple of 16 bytes, at least 64 (got {})",
        buf.len()
    );

    let k1k2 = _mm_set_epi64x(0x01_c6e4_1596, 0x01_5444_2bd4);
    let k3k4 = _mm_set_epi64x(0x00_ccaa_009e, 0x01_7519_97d0);
    let k5k0 = _mm_set_epi64x(0, 0x01_63cd_6124);
    let poly = _mm_set_epi64x(0x01_f701_1641, 0x01_db71_0641);
    let mask32 = _mm_setr_epi32(-1, 0, -1, 0);

    let mut x1 = _mm_xor_si128(load16(buf), _mm_cvtsi32_si128(!crc as i32));
    let mut x2 = load16(&buf[16..]);
    let mut x3 = load16(&buf[32..]);
    let mut x4 = load16(&buf[48..]);

    let mut strides = buf[64..].chunks_exact(64);
    for stride in &mut strides {
        x1 = fold_wide(x1, k1k2, load16(stride));
        x2 = fold_wide(x2, k1k2, load16(&stride[16..]));
        x3 = fold_wide(x3, k1k2, load16(&stride[32..]));
        x4 = fold_wide(x4, k1k2, load16(&stride[48..]));
    }

    // Four accumulators into one.
    x1 = fold_wide(x1, k3k4, x2);
    x1 = fold_wide(x1, k3k4, x3);
    x1 = fold_wide(x1, k3k4, x4);

    for block in strides.remainder().chunks_exact(16) {
        x1 = fold_wide(x1, k3k4, load16(block));
    }

    // 128 -> 64
    let t = _mm_clmulepi64_si128(x1, k3k4, 0x10);
    let x1 = _mm_xor_si128(_mm_srli_si128(x1, 8), t);

    // 64 -> 32
    let t = _mm_srli_si128(x1, 4);
    let x1 = _mm_xor_si128(_mm_clmulepi64_si128(_mm_and_si128(x1, mask32), k5k0, 0x00), t);

    // Barrett reduction
    let t = _mm_clmulepi64_si128(_mm_and_si128(x1, mask32), poly, 0x10);
    let t = _mm_clmulepi64_si128(_mm_and_si128(t, mask32), poly, 0x00);
    let x1 = _mm_xor_si128(x1, t);

    !(_mm_extract_epi32(x1, 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc32::crc32_generic;

    fn can_fold() -> bool {
        crate::simd::detect().can_fold()
    }

    #[test]
    fn test_pclmul_matches_generic() {
        if !can_fold() {
            return;
        }
        let data: Vec<u8> = (0..1024u32).map(|i| (i.wrapping_mul(0x0101_0101) >> 5) as u8).collect();
        for len in (MIN_LEN..=1024).step_by(16) {
            for seed in [0, 0x1234_5678, u32::MAX] {
                // SAFETY: folding support checked above.
                let got = unsafe { crc32_pclmul(seed, &data[..len]) };
                assert_eq!(got, crc32_generic(seed, &data[..len]), "len={len} seed={seed:#x}");
            }
        }
    }

    #[test]
    fn test_pclmul_zeros() {
        if !can_fold() {
            return;
        }
        let zeros = [0u8; 64];
        // SAFETY: folding support checked above.
        assert_eq!(unsafe { crc32_pclmul(0, &zeros) }, crc32_generic(0, &zeros));
    }
}
