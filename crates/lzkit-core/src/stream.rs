//! Running CRC-32 for a compression or decompression stream.
//!
//! A [`CrcStream`] is owned by one stream. When the dispatch table selected the
//! folding engine it keeps a [`FoldState`] and only produces a 32-bit value on
//! [`finalize`](CrcStream::finalize); otherwise it keeps the plain CRC register.

use crate::crc32::fold::FoldState;
use crate::crc32::Crc32Fn;
use crate::{CrcBackend, Dispatch, Error, Result};

/// Checksum state carried across calls.
#[derive(Clone, Debug)]
pub struct CrcStream {
    check: u32,
    fold: Option<FoldState>,
    backend: CrcBackend,
    crc32: Crc32Fn,
}

impl CrcStream {
    /// A stream using the process-wide dispatch table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dispatch(crate::dispatch())
    }

    /// A stream using the engines of `dispatch`.
    #[must_use]
    pub fn with_dispatch(dispatch: &Dispatch) -> Self {
        let mut stream = Self {
            check: 0,
            fold: None,
            backend: dispatch.crc_backend(),
            crc32: dispatch.crc32_fn(),
        };
        stream.reset();
        stream
    }

    /// Start over with an empty checksum.
    pub fn reset(&mut self) {
        self.check = 0;
        self.fold = match self.backend {
            CrcBackend::Pclmul => Some(FoldState::new()),
            CrcBackend::Generic | CrcBackend::Armv8 => None,
        };
    }

    /// Add `data` to the checksum.
    pub fn update(&mut self, data: &[u8]) {
        #[cfg(target_arch = "x86_64")]
        if let Some(state) = self.fold.as_mut() {
            // SAFETY: a fold state only exists when the dispatch table that
            // created this stream verified the folding instructions.
            unsafe { crate::crc32::fold::fold(state, data) };
            return;
        }
        self.check = (self.crc32)(self.check, data);
    }

    /// Copy `src` to the front of `dst` and add it to the checksum.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `dst` is shorter than `src`.
    pub fn copy_with_crc(&mut self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        if dst.len() < src.len() {
            return Err(Error::BufferTooSmall { needed: src.len(), available: dst.len() });
        }
        #[cfg(target_arch = "x86_64")]
        if let Some(state) = self.fold.as_mut() {
            // SAFETY: see `update`.
            unsafe { crate::crc32::fold::fold_copy(state, dst, src) };
            return Ok(());
        }
        dst[..src.len()].copy_from_slice(src);
        self.check = (self.crc32)(self.check, src);
        Ok(())
    }

    /// Checksum of everything added so far.
    ///
    /// The stream can keep accepting data afterwards.
    pub fn finalize(&mut self) -> u32 {
        #[cfg(target_arch = "x86_64")]
        if let Some(state) = &self.fold {
            // SAFETY: see `update`.
            self.check = unsafe { crate::crc32::fold::fold_finalize(state) };
        }
        self.check
    }

    /// The value from the last [`finalize`](Self::finalize), or the running
    /// CRC when the table engine is in use.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.check
    }

    /// Whether the folding engine carries this stream.
    #[must_use]
    pub fn is_folding(&self) -> bool {
        self.fold.is_some()
    }

    /// Engine this stream was created with.
    #[must_use]
    pub fn backend(&self) -> CrcBackend {
        self.backend
    }
}

impl Default for CrcStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Reset `stream` to an empty checksum.
pub fn crc_reset(stream: &mut CrcStream) {
    stream.reset();
}

/// Add `data` to `stream`.
pub fn crc_update(stream: &mut CrcStream, data: &[u8]) {
    stream.update(data);
}

/// Copy `src` into `dst` while adding it to `stream`.
///
/// # Errors
///
/// Returns [`Error::BufferTooSmall`] if `dst` is shorter than `src`.
pub fn copy_with_crc(stream: &mut CrcStream, dst: &mut [u8], src: &[u8]) -> Result<()> {
    stream.copy_with_crc(dst, src)
}

/// Produce the checksum of everything added to `stream`.
pub fn crc_finalize(stream: &mut CrcStream) -> u32 {
    stream.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispatchBuilder;

    fn streams() -> Vec<CrcStream> {
        let mut all = vec![CrcStream::with_dispatch(&DispatchBuilder::new().portable().build().unwrap())];
        for backend in [CrcBackend::Pclmul, CrcBackend::Armv8] {
            if let Ok(dispatch) = DispatchBuilder::new().prefer_crc(backend).build() {
                all.push(CrcStream::with_dispatch(&dispatch));
            }
        }
        all
    }

    fn payload() -> Vec<u8> {
        (0..3000u32).map(|i| (i.wrapping_mul(7919) >> 3) as u8).collect()
    }

    #[test]
    fn test_empty_stream_is_zero() {
        for mut stream in streams() {
            assert_eq!(stream.finalize(), 0);
        }
    }

    #[test]
    fn test_update_in_pieces() {
        let data = payload();
        for mut stream in streams() {
            for piece in data.chunks(97) {
                crc_update(&mut stream, piece);
            }
            assert_eq!(crc_finalize(&mut stream), crate::crc32(0, &data), "{:?}", stream.backend());
        }
    }

    #[test]
    fn test_copy_with_crc_copies_and_checksums() {
        let data = payload();
        for mut stream in streams() {
            let mut out = vec![0u8; data.len()];
            let mut pos = 0;
            for piece in data.chunks(500) {
                copy_with_crc(&mut stream, &mut out[pos..], piece).unwrap();
                pos += piece.len();
            }
            assert_eq!(out, data);
            assert_eq!(stream.finalize(), crate::crc32(0, &data));
        }
    }

    #[test]
    fn test_copy_with_crc_short_destination() {
        for mut stream in streams() {
            let mut out = [0u8; 4];
            let err = stream.copy_with_crc(&mut out, b"too long").unwrap_err();
            assert!(matches!(err, Error::BufferTooSmall { needed: 8, available: 4 }));
            assert_eq!(stream.finalize(), 0);
        }
    }

    #[test]
    fn test_reset_starts_over() {
        for mut stream in streams() {
            stream.update(b"garbage");
            crc_reset(&mut stream);
            stream.update(b"123456789");
            assert_eq!(stream.finalize(), 0xcbf4_3926);
            assert_eq!(stream.value(), 0xcbf4_3926);
        }
    }

    #[test]
    fn test_folding_flag_follows_backend() {
        for stream in streams() {
            assert_eq!(stream.is_folding(), stream.backend() == CrcBackend::Pclmul);
        }
        assert_eq!(CrcStream::new().backend(), crate::dispatch().crc_backend());
    }
}
