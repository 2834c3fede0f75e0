//! CRC-32 combination through polynomial arithmetic modulo the generator.
//!
//! Polynomials are stored reflected: bit 31 is `x^0`, bit 0 is `x^31`.

use super::tables::{tables, POLY};

/// `a * b mod p`.
pub(crate) fn multmodp(a: u32, mut b: u32) -> u32 {
    if a == 0 {
        return 0;
    }
    let mut m = 1u32 << 31;
    let mut p = 0u32;
    loop {
        if a & m != 0 {
            p ^= b;
            if a & (m - 1) == 0 {
                break;
            }
        }
        m >>= 1;
        b = if b & 1 != 0 { (b >> 1) ^ POLY } else { b >> 1 };
    }
    p
}

/// `x^(n * 2^k) mod p`.
pub(crate) fn x2nmodp(mut n: u64, mut k: u32) -> u32 {
    let x2n = tables().x2n();
    let mut p = 1u32 << 31;
    while n != 0 {
        if n & 1 != 0 {
            p = multmodp(x2n[(k & 31) as usize], p);
        }
        n >>= 1;
        k += 1;
    }
    p
}

/// CRC-32 of `A ++ B` from `crc32(0, A)`, `crc32(0, B)` and `B.len()`.
///
/// More generally, `crc32_combine(crc32(c, A), crc32(0, B), len)` equals
/// `crc32(c, A ++ B)`.
///
/// # Example
///
/// ```
/// use lzkit_core::{crc32, crc32_combine};
///
/// let whole = crc32(0, b"hello world");
/// let joined = crc32_combine(crc32(0, b"hello "), crc32(0, b"world"), 5);
/// assert_eq!(joined, whole);
/// ```
#[must_use]
pub fn crc32_combine(crc1: u32, crc2: u32, len2: u64) -> u32 {
    multmodp(x2nmodp(len2, 3), crc1) ^ crc2
}

/// The operator `x^(8 * len2) mod p`, reusable with [`crc32_combine_op`].
#[must_use]
pub fn crc32_combine_gen(len2: u64) -> u32 {
    x2nmodp(len2, 3)
}

/// [`crc32_combine`] with an operator precomputed by [`crc32_combine_gen`].
#[must_use]
pub fn crc32_combine_op(crc1: u32, crc2: u32, op: u32) -> u32 {
    multmodp(op, crc1) ^ crc2
}
