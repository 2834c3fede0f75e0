//! AVX2 `compare256`, 32 bytes per step.

use std::arch::x86_64::{_mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_movemask_epi8};

use super::COMPARE_LEN;

/// AVX2 comparator.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn compare256_avx2(src0: &[u8], src1: &[u8]) -> usize {
    let (src0, src1) = (&src0[..COMPARE_LEN], &src1[..COMPARE_LEN]);
    let mut offset = 0;
    while offset < COMPARE_LEN {
        let a = _mm256_loadu_si256(src0[offset..].as_ptr().cast());
        let b = _mm256_loadu_si256(src1[offset..].as_ptr().cast());
        let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(a, b)) as u32;
        if mask != u32::MAX {
            return offset + (!mask).trailing_zeros() as usize;
        }
        offset += 32;
    }
    COMPARE_LEN
}
