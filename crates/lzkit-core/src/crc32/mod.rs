//! CRC-32 (ISO-HDLC / zlib), reflected polynomial `0xEDB88320`.
//!
//! Three engines compute the same function:
//!
//! - the table engine ([`crc32_generic`]), portable slice-by-4;
//! - the folding engine, carry-less multiplication on `x86_64` with
//!   PCLMULQDQ. [`pclmul`] handles whole buffers and [`fold`] keeps a
//!   resumable state for streams;
//! - the ARMv8 CRC32 instructions on AArch64.
//!
//! [`crc32`] routes through the process-wide [`Dispatch`](crate::Dispatch).
//!
//! ```
//! use lzkit_core::crc32;
//!
//! assert_eq!(crc32(0, b"123456789"), 0xCBF4_3926);
//! assert_eq!(crc32(0, b""), 0);
//! ```

#[cfg(target_arch = "aarch64")]
pub mod armv8;
mod combine;
pub mod fold;
mod generic;
mod parallel;
#[cfg(target_arch = "x86_64")]
pub mod pclmul;
mod tables;

pub use combine::{crc32_combine, crc32_combine_gen, crc32_combine_op};
pub use generic::{crc32_big, crc32_bytewise, crc32_generic, crc32_little};
pub use parallel::crc32_chunks;
#[cfg(feature = "parallel")]
pub use parallel::crc32_parallel;
pub use tables::{crc_table, tables, CrcTables, POLY};

use crate::CrcBackend;

/// Signature shared by the whole-buffer CRC-32 engines.
pub type Crc32Fn = fn(u32, &[u8]) -> u32;

/// CRC-32 of `buf` continuing from `crc`.
///
/// An empty `buf` returns `crc` unchanged. The first call of any kind runs
/// CPU detection and builds the dispatch table.
pub fn crc32(crc: u32, buf: &[u8]) -> u32 {
    let dispatch = crate::dispatch();
    if buf.is_empty() {
        return crc;
    }
    dispatch.crc32(crc, buf)
}

/// Whole-buffer engine for `backend`, or `None` if this CPU cannot run it.
#[must_use]
pub fn for_backend(backend: CrcBackend) -> Option<Crc32Fn> {
    if !crate::simd::detect().supports_crc(backend) {
        return None;
    }
    match backend {
        CrcBackend::Generic => Some(crc32_generic),
        #[cfg(target_arch = "x86_64")]
        CrcBackend::Pclmul => Some(crc32_folding),
        #[cfg(not(target_arch = "x86_64"))]
        CrcBackend::Pclmul => None,
        #[cfg(target_arch = "aarch64")]
        CrcBackend::Armv8 => Some(crc32_hardware),
        #[cfg(not(target_arch = "aarch64"))]
        CrcBackend::Armv8 => None,
    }
}

#[cfg(target_arch = "aarch64")]
fn crc32_hardware(crc: u32, buf: &[u8]) -> u32 {
    // SAFETY: only handed out by `for_backend` after the CRC32 extension check.
    unsafe { armv8::crc32_armv8(crc, buf) }
}

/// Folding engine for the bulk, table engine for the last `len % 16` bytes.
#[cfg(target_arch = "x86_64")]
fn crc32_folding(crc: u32, buf: &[u8]) -> u32 {
    if buf.len() < pclmul::MIN_LEN {
        return crc32_generic(crc, buf);
    }
    let bulk = buf.len() & !15;
    // SAFETY: only handed out by `for_backend` after the folding check.
    let crc = unsafe { pclmul::crc32_pclmul(crc, &buf[..bulk]) };
    crc32_generic(crc, &buf[bulk..])
}
