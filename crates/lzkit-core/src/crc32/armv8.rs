//! CRC-32 with the ARMv8 CRC32 extension (`crc32x` / `crc32b`).

use std::arch::aarch64::{__crc32b, __crc32d};

use crate::chunk::read_array;

/// CRC-32 of `buf` continuing from `crc`, eight bytes per instruction.
///
/// # Safety
///
/// The CPU must implement the CRC32 extension.
#[target_feature(enable = "crc")]
pub unsafe fn crc32_armv8(crc: u32, buf: &[u8]) -> u32 {
    let mut c = !crc;
    let mut words = buf.chunks_exact(8);
    for word in &mut words {
        c = __crc32d(c, u64::from_le_bytes(read_array::<8>(word)));
    }
    for &byte in words.remainder() {
        c = __crc32b(c, byte);
    }
    !c
}
