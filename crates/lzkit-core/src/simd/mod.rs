//! SIMD capability detection.

mod detect;

pub use detect::{detect, detect_backend, is_available, CpuFeatures};

use crate::SimdBackend;

/// Get the best available chunk engine for this CPU.
#[must_use]
pub fn best_backend() -> SimdBackend {
    detect_backend()
}

/// Check if a specific chunk engine is available.
#[must_use]
pub fn backend_available(backend: SimdBackend) -> bool {
    is_available(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_always_available() {
        assert!(backend_available(SimdBackend::Scalar));
    }

    #[test]
    fn test_best_backend_returns_valid() {
        let backend = best_backend();
        assert!(backend_available(backend));
    }
}
