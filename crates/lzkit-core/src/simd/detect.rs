//! CPU feature detection for the chunk and CRC engines.

use std::sync::OnceLock;

use crate::{CrcBackend, SimdBackend};

/// Instruction-set extensions relevant to the kernels in this crate.
///
/// Obtain the process-wide value with [`detect`]; [`CpuFeatures::probe`] runs
/// the underlying queries again and is only useful for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CpuFeatures {
    /// SSE2 support (baseline on `x86_64`).
    pub sse2: bool,
    /// SSSE3 support (`pshufb`).
    pub ssse3: bool,
    /// SSE4.1 support (`pextrd`).
    pub sse41: bool,
    /// SSE4.2 support (hardware CRC-32C instruction).
    pub sse42: bool,
    /// Carry-less multiplication on 128-bit lanes.
    pub pclmulqdq: bool,
    /// AVX2 support.
    pub avx2: bool,
    /// AVX-512F support.
    pub avx512f: bool,
    /// AVX-512BW support.
    pub avx512bw: bool,
    /// Carry-less multiplication on 256/512-bit lanes.
    pub vpclmulqdq: bool,
    /// ARM NEON support.
    pub neon: bool,
    /// ARMv8 CRC32 extension.
    pub crc: bool,
}

impl CpuFeatures {
    /// Query the current CPU.
    #[must_use]
    pub fn probe() -> Self {
        #[cfg(miri)]
        {
            Self::default()
        }

        #[cfg(all(not(miri), target_arch = "x86_64"))]
        {
            Self {
                sse2: std::arch::is_x86_feature_detected!("sse2"),
                ssse3: std::arch::is_x86_feature_detected!("ssse3"),
                sse41: std::arch::is_x86_feature_detected!("sse4.1"),
                sse42: std::arch::is_x86_feature_detected!("sse4.2"),
                pclmulqdq: std::arch::is_x86_feature_detected!("pclmulqdq"),
                avx2: std::arch::is_x86_feature_detected!("avx2"),
                avx512f: std::arch::is_x86_feature_detected!("avx512f"),
                avx512bw: std::arch::is_x86_feature_detected!("avx512bw"),
                vpclmulqdq: std::arch::is_x86_feature_detected!("vpclmulqdq"),
                neon: false,
                crc: false,
            }
        }

        #[cfg(all(not(miri), target_arch = "aarch64"))]
        {
            Self {
                neon: true, // NEON is mandatory on AArch64
                crc: std::arch::is_aarch64_feature_detected!("crc"),
                ..Self::default()
            }
        }

        #[cfg(all(not(miri), not(any(target_arch = "x86_64", target_arch = "aarch64"))))]
        {
            Self::default()
        }
    }

    /// Check if AVX-512 is fully supported.
    #[must_use]
    pub fn has_avx512(&self) -> bool {
        self.avx512f && self.avx512bw
    }

    /// Hardware CRC-32C instruction, used by the match-finder hash.
    #[must_use]
    pub fn has_crc32_instruction(&self) -> bool {
        self.sse42
    }

    /// Everything the 128-bit folding CRC needs: `pclmulqdq`, `pshufb` and `pextrd`.
    #[must_use]
    pub fn can_fold(&self) -> bool {
        self.pclmulqdq && self.ssse3 && self.sse41
    }

    /// Wide carry-less multiplication paired with AVX-512.
    #[must_use]
    pub fn has_wide_clmul(&self) -> bool {
        self.vpclmulqdq && self.has_avx512()
    }

    /// Widest chunk engine this CPU can run.
    #[must_use]
    pub fn best_backend(&self) -> SimdBackend {
        if self.avx2 {
            SimdBackend::Avx2
        } else if self.sse2 {
            SimdBackend::Sse2
        } else if self.neon {
            SimdBackend::Neon
        } else {
            SimdBackend::Scalar
        }
    }

    /// Fastest CRC-32 engine this CPU can run.
    #[must_use]
    pub fn best_crc_backend(&self) -> CrcBackend {
        if self.can_fold() {
            CrcBackend::Pclmul
        } else if self.crc {
            CrcBackend::Armv8
        } else {
            CrcBackend::Generic
        }
    }

    /// Check if a chunk engine can run on this CPU.
    #[must_use]
    pub fn supports(&self, backend: SimdBackend) -> bool {
        match backend {
            SimdBackend::Scalar => true,
            SimdBackend::Sse2 => cfg!(target_arch = "x86_64") && self.sse2,
            SimdBackend::Avx2 => cfg!(target_arch = "x86_64") && self.avx2,
            SimdBackend::Neon => cfg!(target_arch = "aarch64") && self.neon,
        }
    }

    /// Check if a CRC-32 engine can run on this CPU.
    #[must_use]
    pub fn supports_crc(&self, backend: CrcBackend) -> bool {
        match backend {
            CrcBackend::Generic => true,
            CrcBackend::Pclmul => cfg!(target_arch = "x86_64") && self.can_fold(),
            CrcBackend::Armv8 => cfg!(target_arch = "aarch64") && self.crc,
        }
    }
}

static FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

/// Features of the current CPU, probed once per process.
///
/// Concurrent first calls block until one probe finishes; every caller sees
/// the same value.
pub fn detect() -> CpuFeatures {
    *FEATURES.get_or_init(|| {
        let features = CpuFeatures::probe();
        tracing::debug!(
            ?features,
            chunk = ?features.best_backend(),
            crc = ?features.best_crc_backend(),
            "detected CPU features"
        );
        features
    })
}

/// Detect the best available chunk engine.
#[must_use]
pub fn detect_backend() -> SimdBackend {
    detect().best_backend()
}

/// Check if a specific chunk engine is available.
#[must_use]
pub fn is_available(backend: SimdBackend) -> bool {
    detect().supports(backend)
}
