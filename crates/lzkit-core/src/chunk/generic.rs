//! Portable 8-byte chunk engine.

use super::{read_array, Chunk};
use crate::SimdBackend;

/// A 64-bit word holding eight window bytes in memory order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordChunk(u64);

impl Chunk for WordChunk {
    const SIZE: usize = 8;

    #[inline(always)]
    unsafe fn load(src: &[u8]) -> Self {
        Self(u64::from_ne_bytes(read_array::<8>(src)))
    }

    #[inline(always)]
    unsafe fn store(self, dst: &mut [u8]) {
        dst[..8].copy_from_slice(&self.0.to_ne_bytes());
    }

    #[inline(always)]
    unsafe fn broadcast(src: &[u8], width: usize) -> Self {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8));
        let pattern = &src[..width];
        let mut bytes = [0u8; 8];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = pattern[i % width];
        }
        Self(u64::from_ne_bytes(bytes))
    }
}

chunk_engine!(WordChunk, SimdBackend::Scalar);
