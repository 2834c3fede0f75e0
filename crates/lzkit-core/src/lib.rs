//! Data-movement and checksum kernels for LZ77 codecs, with runtime SIMD dispatch.
//!
//! The crate provides the architecture-specific inner loops an inflate/deflate
//! state machine leans on:
//!
//! - [`chunk`]: overlap-aware copies and pattern fills that expand LZ77
//!   back-references, in 8, 16 and 32-byte engines;
//! - [`compare`]: `compare256`, the match-length primitive of the match finder;
//! - [`crc32`]: table-driven, carry-less-multiply and ARMv8 CRC-32, plus combine;
//! - [`stream`]: the per-stream running checksum;
//! - [`hash`]: hash-chain insertion keyed by the CRC-32C instruction.
//!
//! CPU features are probed once per process ([`simd::detect`]) and the best
//! engines are collected in a [`Dispatch`] table ([`dispatch`]). The free
//! functions below route through that table.
//!
//! # Example
//!
//! ```
//! use lzkit_core::{chunkmemset_safe, crc32, crc32_combine};
//!
//! let mut window = vec![0u8; 64];
//! window[..3].copy_from_slice(b"abc");
//!
//! // Expand a distance-3 back-reference of length 9.
//! let end = chunkmemset_safe(&mut window, 3, 3, 9, 61);
//! assert_eq!(&window[..end], b"abcabcabcabc");
//!
//! let whole = crc32(0, &window[..end]);
//! assert_eq!(whole, crc32_combine(crc32(0, b"abc"), crc32(0, b"abcabcabc"), 9));
//! ```

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod benchmark;
pub mod chunk;
pub mod compare;
pub mod crc32;
mod error;
pub mod hash;
pub mod simd;
pub mod stream;

pub use chunk::ChunkOps;
pub use compare::compare256_checked;
#[cfg(feature = "parallel")]
pub use crc32::crc32_parallel;
pub use crc32::{crc32, crc32_chunks, crc32_combine, crc32_combine_gen, crc32_combine_op, crc_table};
pub use error::{Error, Result};
pub use hash::HashChains;
pub use simd::CpuFeatures;
pub use stream::{copy_with_crc, crc_finalize, crc_reset, crc_update, CrcStream};

use std::sync::OnceLock;

use compare::Compare256Fn;
use crc32::Crc32Fn;

/// Chunk engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimdBackend {
    /// Portable 64-bit words.
    #[default]
    Scalar,
    /// SSE2 (128-bit).
    Sse2,
    /// AVX2 (256-bit).
    Avx2,
    /// ARM NEON (128-bit).
    Neon,
}

/// CRC-32 engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrcBackend {
    /// Slice-by-4 tables.
    #[default]
    Generic,
    /// Carry-less multiplication folding (PCLMULQDQ).
    Pclmul,
    /// ARMv8 CRC32 instructions.
    Armv8,
}

/// The engines chosen for this process (or for one [`DispatchBuilder`]).
#[derive(Debug, Clone, Copy)]
pub struct Dispatch {
    features: CpuFeatures,
    chunk: ChunkOps,
    compare256: Compare256Fn,
    crc_backend: CrcBackend,
    crc32: Crc32Fn,
}

impl Dispatch {
    /// Table that uses no optional instructions.
    #[must_use]
    pub fn portable() -> Self {
        Self {
            features: simd::detect(),
            chunk: ChunkOps::generic(),
            compare256: compare::compare256_word,
            crc_backend: CrcBackend::Generic,
            crc32: crc32::crc32_generic,
        }
    }

    fn detect() -> Self {
        DispatchBuilder::new().build().unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to portable engines");
            Self::portable()
        })
    }

    /// Features the table was built from.
    #[must_use]
    pub fn features(&self) -> CpuFeatures {
        self.features
    }

    /// Selected chunk engine.
    #[must_use]
    pub fn backend(&self) -> SimdBackend {
        self.chunk.backend()
    }

    /// Selected CRC-32 engine.
    #[must_use]
    pub fn crc_backend(&self) -> CrcBackend {
        self.crc_backend
    }

    /// Chunk operations of the selected engine.
    #[must_use]
    pub fn chunk(&self) -> &ChunkOps {
        &self.chunk
    }

    pub(crate) fn crc32_fn(&self) -> Crc32Fn {
        self.crc32
    }

    /// CRC-32 of `buf` continuing from `crc`.
    #[must_use]
    pub fn crc32(&self, crc: u32, buf: &[u8]) -> u32 {
        (self.crc32)(crc, buf)
    }

    /// Index of the first differing byte in the first 256 bytes, or 256.
    #[must_use]
    pub fn compare256(&self, src0: &[u8], src1: &[u8]) -> usize {
        (self.compare256)(src0, src1)
    }

    /// See [`chunkcopy_safe`].
    pub fn chunkcopy_safe(&self, window: &mut [u8], out: usize, from: usize, len: usize, safe: usize) -> usize {
        self.chunk.copy_safe(window, out, from, len, safe)
    }

    /// See [`chunkmemset_safe`].
    pub fn chunkmemset_safe(&self, window: &mut [u8], out: usize, dist: usize, len: usize, left: usize) -> usize {
        self.chunk.memset_fill_safe(window, out, dist, len, left)
    }

    /// A fresh running checksum using this table's CRC engine.
    #[must_use]
    pub fn stream(&self) -> CrcStream {
        CrcStream::with_dispatch(self)
    }
}

/// Builder for a [`Dispatch`] table.
#[derive(Debug, Clone, Default)]
pub struct DispatchBuilder {
    preferred_backend: Option<SimdBackend>,
    preferred_crc: Option<CrcBackend>,
}

impl DispatchBuilder {
    /// Builder that picks the best engines for this CPU.
    #[must_use]
    pub fn new() -> Self {
        Self { preferred_backend: None, preferred_crc: None }
    }

    /// Request a specific chunk engine.
    #[must_use]
    pub fn prefer_backend(mut self, backend: SimdBackend) -> Self {
        tracing::trace!(?backend, "chunk engine override");
        self.preferred_backend = Some(backend);
        self
    }

    /// Request a specific CRC-32 engine.
    #[must_use]
    pub fn prefer_crc(mut self, backend: CrcBackend) -> Self {
        tracing::trace!(?backend, "CRC-32 engine override");
        self.preferred_crc = Some(backend);
        self
    }

    /// Request the engines that need no optional instructions.
    #[must_use]
    pub fn portable(self) -> Self {
        self.prefer_backend(SimdBackend::Scalar).prefer_crc(CrcBackend::Generic)
    }

    /// Build the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SimdNotAvailable`] or [`Error::CrcEngineNotAvailable`]
    /// if a requested engine cannot run on this CPU.
    pub fn build(self) -> Result<Dispatch> {
        let features = simd::detect();

        let backend = self.preferred_backend.unwrap_or_else(|| features.best_backend());
        let chunk = ChunkOps::for_backend(backend).ok_or(Error::SimdNotAvailable(backend))?;
        let compare256 = compare::for_backend(backend).ok_or(Error::SimdNotAvailable(backend))?;

        let crc_backend = self.preferred_crc.unwrap_or_else(|| features.best_crc_backend());
        let crc32 = crc32::for_backend(crc_backend).ok_or(Error::CrcEngineNotAvailable(crc_backend))?;

        tracing::debug!(
            ?backend,
            ?crc_backend,
            chunk_size = chunk.chunk_size(),
            "built dispatch table"
        );
        Ok(Dispatch { features, chunk, compare256, crc_backend, crc32 })
    }
}

static DISPATCH: OnceLock<Dispatch> = OnceLock::new();

/// The process-wide dispatch table, built on first use.
pub fn dispatch() -> &'static Dispatch {
    DISPATCH.get_or_init(Dispatch::detect)
}

/// Copy up to `len` bytes from `window[from..]` to `window[out..]` without
/// writing past index `safe`, reproducing LZ77 self-overlap exactly.
///
/// Returns the index after the last byte written.
///
/// ```
/// let mut window = *b"hello\0\0\0\0\0\0\0";
/// let end = lzkit_core::chunkcopy_safe(&mut window, 5, 0, 20, 11);
/// assert_eq!(end, 12);
/// assert_eq!(&window, b"hellohellohe");
/// ```
pub fn chunkcopy_safe(window: &mut [u8], out: usize, from: usize, len: usize, safe: usize) -> usize {
    dispatch().chunkcopy_safe(window, out, from, len, safe)
}

/// Fill `min(len, left)` bytes at `window[out..]` by repeating the `dist`
/// bytes before `out`.
///
/// Returns the index after the last byte written.
pub fn chunkmemset_safe(window: &mut [u8], out: usize, dist: usize, len: usize, left: usize) -> usize {
    dispatch().chunkmemset_safe(window, out, dist, len, left)
}

/// Index of the first differing byte in the first 256 bytes, or 256.
///
/// Panics if either slice is shorter than 256 bytes.
#[must_use]
pub fn compare256(src0: &[u8], src1: &[u8]) -> usize {
    dispatch().compare256(src0, src1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let dispatch = DispatchBuilder::new().build().unwrap();
        assert_eq!(dispatch.backend(), simd::detect().best_backend());
        assert_eq!(dispatch.crc_backend(), simd::detect().best_crc_backend());
    }

    #[test]
    fn test_builder_portable() {
        let dispatch = DispatchBuilder::new().portable().build().unwrap();
        assert_eq!(dispatch.backend(), SimdBackend::Scalar);
        assert_eq!(dispatch.crc_backend(), CrcBackend::Generic);
        assert_eq!(dispatch.chunk().chunk_size(), 8);
    }

    #[test]
    fn test_builder_scalar_always_available() {
        let result = DispatchBuilder::new().prefer_backend(SimdBackend::Scalar).build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_rejects_unavailable_backend() {
        for backend in [SimdBackend::Sse2, SimdBackend::Avx2, SimdBackend::Neon] {
            let result = DispatchBuilder::new().prefer_backend(backend).build();
            if simd::is_available(backend) {
                assert_eq!(result.unwrap().backend(), backend);
            } else {
                assert!(matches!(result, Err(Error::SimdNotAvailable(b)) if b == backend));
            }
        }
    }

    #[test]
    fn test_builder_rejects_unavailable_crc() {
        for backend in [CrcBackend::Pclmul, CrcBackend::Armv8] {
            let result = DispatchBuilder::new().prefer_crc(backend).build();
            if simd::detect().supports_crc(backend) {
                assert_eq!(result.unwrap().crc_backend(), backend);
            } else {
                assert!(matches!(result, Err(Error::CrcEngineNotAvailable(b)) if b == backend));
            }
        }
    }

    #[test]
    fn test_dispatch_is_shared() {
        assert!(std::ptr::eq(dispatch(), dispatch()));
    }

    #[test]
    fn test_portable_table_computes_same_results() {
        let portable = Dispatch::portable();
        let best = dispatch();
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(portable.crc32(0, &data), best.crc32(0, &data));

        let mut b = data.clone();
        b[77] = !b[77];
        assert_eq!(portable.compare256(&data, &b), 77);
        assert_eq!(best.compare256(&data, &b), 77);
    }

    #[test]
    fn test_free_functions() {
        assert_eq!(crc32(0, b"123456789"), 0xcbf4_3926);
        let x = [5u8; 256];
        assert_eq!(compare256(&x, &x), 256);

        let mut window = vec![0u8; 40];
        window[..5].copy_from_slice(&[1, 2, 3, 4, 5]);
        let end = chunkcopy_safe(&mut window, 5, 0, 20, 39);
        assert_eq!(end, 25);
        assert_eq!(&window[20..25], &[1, 2, 3, 4, 5]);

        let end = chunkmemset_safe(&mut window, 25, 1, 100, 15);
        assert_eq!(end, 40);
        assert!(window[25..].iter().all(|&b| b == 5));
    }

    #[test]
    fn test_dispatch_stream() {
        let mut stream = dispatch().stream();
        stream.update(b"123456789");
        assert_eq!(stream.finalize(), 0xcbf4_3926);
    }
}
