//! Chunk engines: fixed-width copy and pattern-fill primitives for LZ77 output.
//!
//! Every engine works on a single `window` slice and addresses it by index, so
//! a back-reference is simply a `src` index below `dst`. All engines share the
//! algorithms in `kernel`; they differ only in the [`Chunk`] register type:
//!
//! | Engine | Chunk | Width |
//! |--------|-------|-------|
//! | [`SimdBackend::Scalar`] | `u64` | 8 |
//! | [`SimdBackend::Sse2`] | `__m128i` | 16 |
//! | [`SimdBackend::Avx2`] | `__m256i` | 32 |
//! | [`SimdBackend::Neon`] | `uint8x16_t` | 16 |
//!
//! Callers go through a [`ChunkOps`] table selected once at startup.

use crate::SimdBackend;

/// A fixed-width register value moved through unaligned loads and stores.
///
/// Loads and stores touch exactly [`Chunk::SIZE`] bytes and panic when the
/// slice is shorter.
pub trait Chunk: Copy {
    /// Width in bytes.
    const SIZE: usize;

    /// Load the first `SIZE` bytes of `src`.
    ///
    /// # Safety
    ///
    /// The CPU must support the instructions backing this chunk type.
    unsafe fn load(src: &[u8]) -> Self;

    /// Store into the first `SIZE` bytes of `dst`.
    ///
    /// # Safety
    ///
    /// The CPU must support the instructions backing this chunk type.
    unsafe fn store(self, dst: &mut [u8]);

    /// Replicate the `width`-byte pattern at the start of `src` across a chunk.
    ///
    /// `width` must be 1, 2, 4 or 8.
    ///
    /// # Safety
    ///
    /// The CPU must support the instructions backing this chunk type.
    unsafe fn broadcast(src: &[u8], width: usize) -> Self;
}

/// Read `N` bytes from the front of `src` into an array.
#[inline(always)]
pub(crate) fn read_array<const N: usize>(src: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&src[..N]);
    out
}

/// Copy `N` bytes inside `window`; the two ranges must not overlap.
#[inline(always)]
pub(crate) fn copy_block<const N: usize>(window: &mut [u8], dst: usize, src: usize) {
    let block = read_array::<N>(&window[src..]);
    window[dst..dst + N].copy_from_slice(&block);
}

/// Expands to the unsafe, feature-enabled entry points of one engine plus the
/// safe shims stored in its [`ChunkOps`] table.
macro_rules! chunk_engine {
    ($chunk:ty, $backend:expr $(, $feature:literal)?) => {
        $(#[target_feature(enable = $feature)])?
        unsafe fn copy_impl(window: &mut [u8], dst: usize, src: usize, len: usize) -> usize {
            $crate::chunk::kernel::copy::<$chunk>(window, dst, src, len)
        }

        $(#[target_feature(enable = $feature)])?
        unsafe fn copy_safe_impl(
            window: &mut [u8],
            dst: usize,
            src: usize,
            len: usize,
            safe: usize,
        ) -> usize {
            $crate::chunk::kernel::copy_safe::<$chunk>(window, dst, src, len, safe)
        }

        $(#[target_feature(enable = $feature)])?
        unsafe fn unroll_impl(
            window: &mut [u8],
            dst: usize,
            dist: &mut usize,
            len: &mut usize,
        ) -> usize {
            $crate::chunk::kernel::unroll::<$chunk>(window, dst, dist, len)
        }

        $(#[target_feature(enable = $feature)])?
        unsafe fn memset_fill_impl(window: &mut [u8], dst: usize, dist: usize, len: usize) -> usize {
            $crate::chunk::kernel::memset_fill::<$chunk>(window, dst, dist, len)
        }

        $(#[target_feature(enable = $feature)])?
        unsafe fn memset_fill_safe_impl(
            window: &mut [u8],
            dst: usize,
            dist: usize,
            len: usize,
            left: usize,
        ) -> usize {
            $crate::chunk::kernel::memset_fill_safe::<$chunk>(window, dst, dist, len, left)
        }

        // The shims below are only reachable through `ops()`, whose caller has
        // checked the CPU.

        fn copy(window: &mut [u8], dst: usize, src: usize, len: usize) -> usize {
            // SAFETY: see `ops`.
            unsafe { copy_impl(window, dst, src, len) }
        }

        fn copy_safe(window: &mut [u8], dst: usize, src: usize, len: usize, safe: usize) -> usize {
            // SAFETY: see `ops`.
            unsafe { copy_safe_impl(window, dst, src, len, safe) }
        }

        fn unroll(window: &mut [u8], dst: usize, dist: &mut usize, len: &mut usize) -> usize {
            // SAFETY: see `ops`.
            unsafe { unroll_impl(window, dst, dist, len) }
        }

        fn memset_fill(window: &mut [u8], dst: usize, dist: usize, len: usize) -> usize {
            // SAFETY: see `ops`.
            unsafe { memset_fill_impl(window, dst, dist, len) }
        }

        fn memset_fill_safe(window: &mut [u8], dst: usize, dist: usize, len: usize, left: usize) -> usize {
            // SAFETY: see `ops`.
            unsafe { memset_fill_safe_impl(window, dst, dist, len, left) }
        }

        /// Operation table for this engine.
        ///
        /// # Safety
        ///
        /// The CPU must support the instructions this engine is compiled for.
        pub(crate) unsafe fn ops() -> $crate::chunk::ChunkOps {
            $crate::chunk::ChunkOps {
                backend: $backend,
                chunk_size: <$chunk as $crate::chunk::Chunk>::SIZE,
                copy,
                copy_safe,
                unroll,
                memset_fill,
                memset_fill_safe,
            }
        }
    };
}

mod kernel;

pub mod generic;

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "x86_64")]
pub mod sse2;

#[cfg(target_arch = "aarch64")]
pub mod neon;

pub use generic::WordChunk;

type CopyFn = fn(&mut [u8], usize, usize, usize) -> usize;
type CopySafeFn = fn(&mut [u8], usize, usize, usize, usize) -> usize;
type UnrollFn = fn(&mut [u8], usize, &mut usize, &mut usize) -> usize;

/// Dispatch table for one chunk engine.
///
/// All positions are indices into `window`. Each operation returns the index
/// one past the last byte it wrote.
#[derive(Clone, Copy, Debug)]
pub struct ChunkOps {
    backend: SimdBackend,
    chunk_size: usize,
    copy: CopyFn,
    copy_safe: CopySafeFn,
    unroll: UnrollFn,
    memset_fill: CopyFn,
    memset_fill_safe: CopySafeFn,
}

impl ChunkOps {
    /// The portable 8-byte engine.
    #[must_use]
    pub fn generic() -> Self {
        // SAFETY: the word engine uses no optional instructions.
        unsafe { generic::ops() }
    }

    /// Table for `backend`, or `None` if this CPU cannot run it.
    #[must_use]
    pub fn for_backend(backend: SimdBackend) -> Option<Self> {
        if !crate::simd::is_available(backend) {
            return None;
        }
        match backend {
            SimdBackend::Scalar => Some(Self::generic()),
            // SAFETY: availability checked above.
            #[cfg(target_arch = "x86_64")]
            SimdBackend::Sse2 => Some(unsafe { sse2::ops() }),
            // SAFETY: availability checked above.
            #[cfg(target_arch = "x86_64")]
            SimdBackend::Avx2 => Some(unsafe { avx2::ops() }),
            // SAFETY: availability checked above.
            #[cfg(target_arch = "aarch64")]
            SimdBackend::Neon => Some(unsafe { neon::ops() }),
            _ => None,
        }
    }

    /// Engine this table belongs to.
    #[must_use]
    pub fn backend(&self) -> SimdBackend {
        self.backend
    }

    /// Chunk width in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Copy `len` bytes from `src` to `dst`.
    ///
    /// The ranges may overlap only if they are at least one chunk apart; the
    /// result then matches a forward byte-by-byte copy.
    pub fn copy(&self, window: &mut [u8], dst: usize, src: usize, len: usize) -> usize {
        (self.copy)(window, dst, src, len)
    }

    /// Copy up to `len` bytes from `src` to `dst`, never writing past index `safe`.
    ///
    /// Any overlap is allowed. When `src < dst` the bytes come out exactly as
    /// a `window[i] = window[i - (dst - src)]` loop would produce them.
    pub fn copy_safe(&self, window: &mut [u8], dst: usize, src: usize, len: usize, safe: usize) -> usize {
        (self.copy_safe)(window, dst, src, len, safe)
    }

    /// Widen a short match distance by replicating the pattern, then emit one
    /// chunk when `chunk <= dist < 2 * chunk`.
    ///
    /// May write up to one chunk past `dst + len`.
    pub fn unroll(&self, window: &mut [u8], dst: usize, dist: &mut usize, len: &mut usize) -> usize {
        (self.unroll)(window, dst, dist, len)
    }

    /// Fill `len` bytes at `dst` by repeating the `dist` bytes that precede it.
    pub fn memset_fill(&self, window: &mut [u8], dst: usize, dist: usize, len: usize) -> usize {
        (self.memset_fill)(window, dst, dist, len)
    }

    /// [`memset_fill`](Self::memset_fill) bounded by `left` writable bytes.
    pub fn memset_fill_safe(&self, window: &mut [u8], dst: usize, dist: usize, len: usize, left: usize) -> usize {
        (self.memset_fill_safe)(window, dst, dist, len, left)
    }
}

impl Default for ChunkOps {
    fn default() -> Self {
        Self::generic()
    }
}
