//! SSE2 16-byte chunk engine for `x86_64`.

use std::arch::x86_64::{
    __m128i, _mm_loadu_si128, _mm_set1_epi16, _mm_set1_epi32, _mm_set1_epi64x, _mm_set1_epi8, _mm_storeu_si128,
};

use super::{read_array, Chunk};
use crate::SimdBackend;

/// One 128-bit SSE register.
#[derive(Clone, Copy, Debug)]
pub struct Sse2Chunk(__m128i);

impl Chunk for Sse2Chunk {
    const SIZE: usize = 16;

    #[inline(always)]
    unsafe fn load(src: &[u8]) -> Self {
        let src = &src[..Self::SIZE];
        Self(_mm_loadu_si128(src.as_ptr().cast()))
    }

    #[inline(always)]
    unsafe fn store(self, dst: &mut [u8]) {
        let dst = &mut dst[..Self::SIZE];
        _mm_storeu_si128(dst.as_mut_ptr().cast(), self.0);
    }

    #[inline(always)]
    unsafe fn broadcast(src: &[u8], width: usize) -> Self {
        Self(match width {
            1 => _mm_set1_epi8(src[0] as i8),
            2 => _mm_set1_epi16(i16::from_ne_bytes(read_array::<2>(src))),
            4 => _mm_set1_epi32(i32::from_ne_bytes(read_array::<4>(src))),
            _ => _mm_set1_epi64x(i64::from_ne_bytes(read_array::<8>(src))),
        })
    }
}

chunk_engine!(Sse2Chunk, SimdBackend::Sse2, "sse2");
