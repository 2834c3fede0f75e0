//! SSE2 `compare256`, 16 bytes per step.

use std::arch::x86_64::{_mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8};

use super::COMPARE_LEN;

/// SSE2 comparator.
///
/// # Safety
///
/// Caller must ensure the CPU supports SSE2.
#[target_feature(enable = "sse2")]
pub unsafe fn compare256_sse2(src0: &[u8], src1: &[u8]) -> usize {
    let (src0, src1) = (&src0[..COMPARE_LEN], &src1[..COMPARE_LEN]);
    let mut offset = 0;
    while offset < COMPARE_LEN {
        let a = _mm_loadu_si128(src0[offset..].as_ptr().cast());
        let b = _mm_loadu_si128(src1[offset..].as_ptr().cast());
        let mask = _mm_movemask_epi8(_mm_cmpeq_epi8(a, b)) as u32;
        if mask != 0xFFFF {
            return offset + (!mask).trailing_zeros() as usize;
        }
        offset += 16;
    }
    COMPARE_LEN
}
