//! Lazily built CRC-32 tables.

use std::sync::OnceLock;

use super::combine::multmodp;

/// Reflected CRC-32 generator polynomial (`x^32 + x^26 + ... + 1`).
pub const POLY: u32 = 0xedb8_8320;

/// Exponents of the generator polynomial's terms, excluding `x^32`.
const POLY_TERMS: [u32; 14] = [0, 1, 2, 4, 5, 7, 8, 10, 11, 12, 16, 22, 23, 26];

/// Byte tables for the slice-by-4 engines and the `x^(2^n)` table for combine.
///
/// Tables 0..4 serve little-endian word order. Tables 4..8 are their
/// byte-swapped counterparts for big-endian word order.
#[derive(Debug)]
pub struct CrcTables {
    crc: [[u32; 256]; 8],
    x2n: [u32; 32],
}

impl CrcTables {
    fn build() -> Self {
        let poly = POLY_TERMS.iter().fold(0u32, |p, &t| p | (1 << (31 - t)));
        debug_assert_eq!(poly, POLY);

        let mut crc = [[0u32; 256]; 8];
        for n in 0..256 {
            let mut c = n as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 { (c >> 1) ^ poly } else { c >> 1 };
            }
            crc[0][n] = c;
            crc[4][n] = c.swap_bytes();
        }
        for n in 0..256 {
            let mut c = crc[0][n];
            for k in 1..4 {
                c = crc[0][(c & 0xff) as usize] ^ (c >> 8);
                crc[k][n] = c;
                crc[k + 4][n] = c.swap_bytes();
            }
        }

        // x^1 in reflected form, then repeated squaring.
        let mut x2n = [0u32; 32];
        let mut p = 1u32 << 30;
        x2n[0] = p;
        for entry in x2n.iter_mut().skip(1) {
            p = multmodp(p, p);
            *entry = p;
        }

        Self { crc, x2n }
    }

    /// The primary byte-at-a-time table.
    #[must_use]
    pub fn byte_table(&self) -> &[u32; 256] {
        &self.crc[0]
    }

    /// All eight slice-by-4 tables.
    #[must_use]
    pub fn slice_tables(&self) -> &[[u32; 256]; 8] {
        &self.crc
    }

    /// `x^(2^n) mod p` for `n` in `0..32`.
    #[must_use]
    pub fn x2n(&self) -> &[u32; 32] {
        &self.x2n
    }
}

static TABLES: OnceLock<CrcTables> = OnceLock::new();

/// The process-wide table set, built on first use.
pub fn tables() -> &'static CrcTables {
    TABLES.get_or_init(|| {
        let tables = CrcTables::build();
        tracing::debug!("built CRC-32 tables");
        tables
    })
}

/// The primary 256-entry CRC-32 table.
pub fn crc_table() -> &'static [u32; 256] {
    tables().byte_table()
}
