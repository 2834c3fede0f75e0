//! Table-driven CRC-32: byte-at-a-time and slice-by-4 in both word orders.
//!
//! All three produce the same result on any host; [`crc32_generic`] picks the
//! slice-by-4 variant whose word order matches the target.

use super::tables::tables;
use crate::chunk::read_array;

/// Byte-at-a-time CRC-32, eight bytes per loop iteration.
#[must_use]
pub fn crc32_bytewise(crc: u32, buf: &[u8]) -> u32 {
    let table = tables().byte_table();
    let mut c = !crc;
    let mut blocks = buf.chunks_exact(8);
    for block in &mut blocks {
        for &b in block {
            c = table[((c ^ u32::from(b)) & 0xff) as usize] ^ (c >> 8);
        }
    }
    for &b in blocks.remainder() {
        c = table[((c ^ u32::from(b)) & 0xff) as usize] ^ (c >> 8);
    }
    !c
}

/// Slice-by-4 over little-endian words.
#[must_use]
pub fn crc32_little(crc: u32, buf: &[u8]) -> u32 {
    let t = tables().slice_tables();
    let mut c = !crc;
    let mut words = buf.chunks_exact(4);
    for word in &mut words {
        c ^= u32::from_le_bytes(read_array::<4>(word));
        c = t[3][(c & 0xff) as usize]
            ^ t[2][((c >> 8) & 0xff) as usize]
            ^ t[1][((c >> 16) & 0xff) as usize]
            ^ t[0][(c >> 24) as usize];
    }
    for &b in words.remainder() {
        c = t[0][((c ^ u32::from(b)) & 0xff) as usize] ^ (c >> 8);
    }
    !c
}

/// Slice-by-4 over big-endian words, working on the byte-swapped register.
#[must_use]
pub fn crc32_big(crc: u32, buf: &[u8]) -> u32 {
    let t = tables().slice_tables();
    let mut c = !crc.swap_bytes();
    let mut words = buf.chunks_exact(4);
    for word in &mut words {
        c ^= u32::from_be_bytes(read_array::<4>(word));
        c = t[4][(c & 0xff) as usize]
            ^ t[5][((c >> 8) & 0xff) as usize]
            ^ t[6][((c >> 16) & 0xff) as usize]
            ^ t[7][(c >> 24) as usize];
    }
    for &b in words.remainder() {
        c = t[4][((c >> 24) ^ u32::from(b)) as usize] ^ (c << 8);
    }
    (!c).swap_bytes()
}

/// Table-driven CRC-32 in the host's native word order.
#[must_use]
pub fn crc32_generic(crc: u32, buf: &[u8]) -> u32 {
    if cfg!(target_endian = "big") {
        crc32_big(crc, buf)
    } else {
        crc32_little(crc, buf)
    }
}
