//! AVX2 32-byte chunk engine for `x86_64`.

use std::arch::x86_64::{
    __m256i, _mm256_loadu_si256, _mm256_set1_epi16, _mm256_set1_epi32, _mm256_set1_epi64x, _mm256_set1_epi8,
    _mm256_storeu_si256,
};

use super::{read_array, Chunk};
use crate::SimdBackend;

/// One 256-bit AVX register.
#[derive(Clone, Copy, Debug)]
pub struct Avx2Chunk(__m256i);

impl Chunk for Avx2Chunk {
    const SIZE: usize = 32;

    #[inline(always)]
    unsafe fn load(src: &[u8]) -> Self {
        let src = &src[..Self::SIZE];
        Self(_mm256_loadu_si256(src.as_ptr().cast()))
    }

    #[inline(always)]
    unsafe fn store(self, dst: &mut [u8]) {
        let dst = &mut dst[..Self::SIZE];
        _mm256_storeu_si256(dst.as_mut_ptr().cast(), self.0);
    }

    #[inline(always)]
    unsafe fn broadcast(src: &[u8], width: usize) -> Self {
        Self(match width {
            1 => _mm256_set1_epi8(src[0] as i8),
            2 => _mm256_set1_epi16(i16::from_ne_bytes(read_array::<2>(src))),
            4 => _mm256_set1_epi32(i32::from_ne_bytes(read_array::<4>(src))),
            _ => _mm256_set1_epi64x(i64::from_ne_bytes(read_array::<8>(src))),
        })
    }
}

chunk_engine!(Avx2Chunk, SimdBackend::Avx2, "avx2");
