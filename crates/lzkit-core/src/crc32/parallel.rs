//! Checksums assembled from independently computed pieces.

use super::combine::crc32_combine;

/// CRC-32 of the concatenation of `pieces`, continuing from `crc`.
///
/// Each piece is checksummed on its own and merged with [`crc32_combine`].
#[must_use]
pub fn crc32_chunks<'a, I>(crc: u32, pieces: I) -> u32
where
    I: IntoIterator<Item = &'a [u8]>,
{
    pieces
        .into_iter()
        .fold(crc, |acc, piece| crc32_combine(acc, crate::crc32(0, piece), piece.len() as u64))
}

/// CRC-32 of `data` split into `piece_len`-byte pieces checksummed on the
/// rayon thread pool.
///
/// The result equals `crc32(crc, data)` for every `piece_len`.
#[cfg(feature = "parallel")]
#[must_use]
pub fn crc32_parallel(crc: u32, data: &[u8], piece_len: usize) -> u32 {
    use rayon::prelude::*;

    use super::combine::{crc32_combine_gen, crc32_combine_op};

    let piece_len = piece_len.max(1);
    let sums: Vec<(u32, usize)> = data.par_chunks(piece_len).map(|p| (crate::crc32(0, p), p.len())).collect();

    // Every piece but the last shares one operator.
    let op = crc32_combine_gen(piece_len as u64);
    sums.into_iter().fold(crc, |acc, (sum, len)| {
        if len == piece_len {
            crc32_combine_op(acc, sum, op)
        } else {
            crc32_combine(acc, sum, len as u64)
        }
    })
}
