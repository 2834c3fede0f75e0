//! Error types for lzkit-core.

use thiserror::Error;

/// Errors reported by the checked entry points and dispatch construction.
///
/// The hot-path primitives (chunk copies, `compare256`, the CRC kernels) never
/// return errors; their preconditions are enforced by slice bounds instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter is outside the range the operation accepts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A caller-supplied buffer is shorter than the operation requires.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// The requested chunk engine cannot run on this CPU.
    #[error("SIMD backend {0:?} not available on this CPU")]
    SimdNotAvailable(crate::SimdBackend),

    /// The requested CRC-32 engine cannot run on this CPU.
    #[error("CRC-32 backend {0:?} not available on this CPU")]
    CrcEngineNotAvailable(crate::CrcBackend),
}

/// Result type for lzkit operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("hash_bits must be in 8..=16".to_string());
        assert!(err.to_string().contains("invalid input"));
        assert!(err.to_string().contains("hash_bits"));
    }

    #[test]
    fn test_error_display_buffer_too_small() {
        let err = Error::BufferTooSmall { needed: 256, available: 100 };
        let msg = err.to_string();
        assert!(msg.contains("256"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_error_display_simd_not_available() {
        let err = Error::SimdNotAvailable(crate::SimdBackend::Avx2);
        assert!(err.to_string().contains("Avx2"));
    }

    #[test]
    fn test_error_display_crc_not_available() {
        let err = Error::CrcEngineNotAvailable(crate::CrcBackend::Pclmul);
        let msg = err.to_string();
        assert!(msg.contains("CRC-32"));
        assert!(msg.contains("Pclmul"));
    }

    #[test]
    fn test_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
