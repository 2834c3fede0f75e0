//! NEON 16-byte chunk engine for AArch64.

use std::arch::aarch64::{
    uint8x16_t, vdupq_n_u16, vdupq_n_u32, vdupq_n_u64, vdupq_n_u8, vld1q_u8, vreinterpretq_u8_u16,
    vreinterpretq_u8_u32, vreinterpretq_u8_u64, vst1q_u8,
};

use super::{read_array, Chunk};
use crate::SimdBackend;

/// One 128-bit NEON register.
#[derive(Clone, Copy, Debug)]
pub struct NeonChunk(uint8x16_t);

impl Chunk for NeonChunk {
    const SIZE: usize = 16;

    #[inline(always)]
    unsafe fn load(src: &[u8]) -> Self {
        let src = &src[..Self::SIZE];
        Self(vld1q_u8(src.as_ptr()))
    }

    #[inline(always)]
    unsafe fn store(self, dst: &mut [u8]) {
        let dst = &mut dst[..Self::SIZE];
        vst1q_u8(dst.as_mut_ptr(), self.0);
    }

    #[inline(always)]
    unsafe fn broadcast(src: &[u8], width: usize) -> Self {
        Self(match width {
            1 => vdupq_n_u8(src[0]),
            2 => vreinterpretq_u8_u16(vdupq_n_u16(u16::from_ne_bytes(read_array::<2>(src)))),
            4 => vreinterpretq_u8_u32(vdupq_n_u32(u32::from_ne_bytes(read_array::<4>(src)))),
            _ => vreinterpretq_u8_u64(vdupq_n_u64(u64::from_ne_bytes(read_array::<8>(src)))),
        })
    }
}

chunk_engine!(NeonChunk, SimdBackend::Neon, "neon");
