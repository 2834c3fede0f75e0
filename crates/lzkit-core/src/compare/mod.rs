//! Match-length comparison over 256-byte windows.
//!
//! `compare256(a, b)` is the index of the first byte where `a` and `b` differ,
//! or 256 when the first 256 bytes agree. Every variant looks at exactly the
//! first 256 bytes of each slice and panics if either is shorter; use
//! [`compare256_checked`] to get an error instead.

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "x86_64")]
pub mod sse2;

use crate::{Error, Result, SimdBackend};

/// Bytes compared per call.
pub const COMPARE_LEN: usize = 256;

/// Signature shared by every comparator variant.
pub type Compare256Fn = fn(&[u8], &[u8]) -> usize;

/// Reference implementation, one byte per step.
#[must_use]
pub fn compare256_bytes(src0: &[u8], src1: &[u8]) -> usize {
    let (src0, src1) = (&src0[..COMPARE_LEN], &src1[..COMPARE_LEN]);
    src0.iter().zip(src1).position(|(a, b)| a != b).unwrap_or(COMPARE_LEN)
}

/// Eight bytes per step; the first mismatch is the lowest set byte of the XOR.
#[must_use]
pub fn compare256_word(src0: &[u8], src1: &[u8]) -> usize {
    let (src0, src1) = (&src0[..COMPARE_LEN], &src1[..COMPARE_LEN]);
    for (i, (a, b)) in src0.chunks_exact(8).zip(src1.chunks_exact(8)).enumerate() {
        let a = u64::from_le_bytes(crate::chunk::read_array::<8>(a));
        let b = u64::from_le_bytes(crate::chunk::read_array::<8>(b));
        let diff = a ^ b;
        if diff != 0 {
            return i * 8 + (diff.trailing_zeros() / 8) as usize;
        }
    }
    COMPARE_LEN
}

/// Length-checked comparison.
///
/// # Errors
///
/// Returns [`Error::BufferTooSmall`] if either slice is shorter than 256 bytes.
pub fn compare256_checked(src0: &[u8], src1: &[u8]) -> Result<usize> {
    let available = src0.len().min(src1.len());
    if available < COMPARE_LEN {
        return Err(Error::BufferTooSmall { needed: COMPARE_LEN, available });
    }
    Ok(crate::compare256(src0, src1))
}

/// Comparator for a chunk engine, or `None` if this CPU cannot run it.
#[must_use]
pub fn for_backend(backend: SimdBackend) -> Option<Compare256Fn> {
    if !crate::simd::is_available(backend) {
        return None;
    }
    Some(match backend {
        #[cfg(target_arch = "x86_64")]
        SimdBackend::Avx2 => compare256_avx2_checked,
        #[cfg(target_arch = "x86_64")]
        SimdBackend::Sse2 => compare256_sse2_checked,
        _ => compare256_word,
    })
}

// Only handed out by `for_backend` after the availability check.

#[cfg(target_arch = "x86_64")]
fn compare256_sse2_checked(src0: &[u8], src1: &[u8]) -> usize {
    // SAFETY: SSE2 availability checked in `for_backend`.
    unsafe { sse2::compare256_sse2(src0, src1) }
}

#[cfg(target_arch = "x86_64")]
fn compare256_avx2_checked(src0: &[u8], src1: &[u8]) -> usize {
    // SAFETY: AVX2 availability checked in `for_backend`.
    unsafe { avx2::compare256_avx2(src0, src1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<(&'static str, Compare256Fn)> {
        let mut all: Vec<(&'static str, Compare256Fn)> = vec![("bytes", compare256_bytes), ("word", compare256_word)];
        for backend in [SimdBackend::Sse2, SimdBackend::Avx2, SimdBackend::Neon] {
            if let Some(f) = for_backend(backend) {
                all.push(("dispatched", f));
            }
        }
        all
    }

    #[test]
    fn test_identical_is_256() {
        let x: Vec<u8> = (0..=255).collect();
        for (name, f) in variants() {
            assert_eq!(f(&x, &x), 256, "{name}");
        }
    }

    #[test]
    fn test_every_mismatch_position() {
        let a: Vec<u8> = (0..300).map(|i| (i * 31) as u8).collect();
        for pos in 0..256 {
            let mut b = a.clone();
            b[pos] ^= 0x40;
            // A second mismatch later must not win.
            if pos + 9 < 256 {
                b[pos + 9] ^= 1;
            }
            for (name, f) in variants() {
                assert_eq!(f(&a, &b), pos, "{name} pos={pos}");
            }
        }
    }

    #[test]
    fn test_ignores_bytes_past_256() {
        let a = vec![7u8; 300];
        let mut b = a.clone();
        b[256] = 0;
        for (name, f) in variants() {
            assert_eq!(f(&a, &b), 256, "{name}");
        }
    }

    #[test]
    fn test_checked_rejects_short_input() {
        let err = compare256_checked(&[0u8; 100], &[0u8; 256]).unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { needed: 256, available: 100 }));
        assert_eq!(compare256_checked(&[1u8; 256], &[1u8; 256]).unwrap(), 256);
    }

    #[test]
    #[should_panic]
    fn test_short_slice_panics() {
        let _ = compare256_word(&[0u8; 255], &[0u8; 256]);
    }
}
