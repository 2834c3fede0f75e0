//! Hash-chain insertion for the deflate match finder.
//!
//! `head[h]` holds the most recent window position whose next bytes hash to
//! `h`; `prev[pos & w_mask]` links each position to the previous one with the
//! same hash. With SSE4.2 the hash is the hardware CRC-32C of the next four
//! bytes, otherwise a multiplicative hash.

use crate::chunk::read_array;
use crate::{Error, Result};

/// Smallest accepted `hash_bits` and `window_bits`.
pub const MIN_BITS: u32 = 8;
/// Largest accepted `hash_bits`.
pub const MAX_HASH_BITS: u32 = 16;
/// Largest accepted `window_bits` (a 32 KiB window).
pub const MAX_WINDOW_BITS: u32 = 15;

/// From this compression level on, only three bytes take part in the hash.
pub const SHORT_HASH_LEVEL: u32 = 6;

const KNUTH: u32 = 2_654_435_761;

type HashFn = fn(u32, u32) -> u32;

/// Head and previous-position tables of the match finder.
#[derive(Clone, Debug)]
pub struct HashChains {
    head: Vec<u16>,
    prev: Vec<u16>,
    hash_bits: u32,
    hash_mask: u32,
    w_mask: usize,
    hash: HashFn,
}

impl HashChains {
    /// Chains for a `2^window_bits` window and `2^hash_bits` buckets, hashing
    /// with the CRC-32C instruction when the CPU has it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either bit count is out of range.
    pub fn new(window_bits: u32, hash_bits: u32) -> Result<Self> {
        let hash = if crate::simd::detect().has_crc32_instruction() {
            hardware_hash()
        } else {
            None
        };
        Self::build(window_bits, hash_bits, hash.unwrap_or(multiplicative_hash))
    }

    /// Like [`new`](Self::new) but always uses the multiplicative hash, so
    /// bucket assignment does not depend on the CPU.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either bit count is out of range.
    pub fn portable(window_bits: u32, hash_bits: u32) -> Result<Self> {
        Self::build(window_bits, hash_bits, multiplicative_hash)
    }

    fn build(window_bits: u32, hash_bits: u32, hash: HashFn) -> Result<Self> {
        if !(MIN_BITS..=MAX_WINDOW_BITS).contains(&window_bits) {
            return Err(Error::InvalidInput(format!(
                "window_bits must be in {MIN_BITS}..={MAX_WINDOW_BITS}, got {window_bits}"
            )));
        }
        if !(MIN_BITS..=MAX_HASH_BITS).contains(&hash_bits) {
            return Err(Error::InvalidInput(format!(
                "hash_bits must be in {MIN_BITS}..={MAX_HASH_BITS}, got {hash_bits}"
            )));
        }
        let w_size = 1usize << window_bits;
        let hash_size = 1usize << hash_bits;
        Ok(Self {
            head: vec![0; hash_size],
            prev: vec![0; w_size],
            hash_bits,
            hash_mask: (hash_size - 1) as u32,
            w_mask: w_size - 1,
            hash,
        })
    }

    /// Bucket for the string at `window[pos..]`.
    ///
    /// Panics if fewer than four bytes remain at `pos`.
    #[must_use]
    pub fn bucket(&self, window: &[u8], pos: usize, level: u32) -> usize {
        let mut val = u32::from_le_bytes(read_array::<4>(&window[pos..]));
        if level >= SHORT_HASH_LEVEL {
            val &= 0x00ff_ffff;
        }
        ((self.hash)(val, self.hash_bits) & self.hash_mask) as usize
    }

    /// Insert the string at `pos` and return the previous head of its chain
    /// (0 for an empty chain).
    ///
    /// # Panics
    ///
    /// Panics if `pos` does not fit in 16 bits or fewer than four bytes
    /// remain at `pos`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert_string(&mut self, window: &[u8], pos: usize, level: u32) -> u16 {
        assert!(pos <= usize::from(u16::MAX), "position {pos} outside a 64 KiB window");
        self.link(window, pos, pos as u16, level)
    }

    /// [`insert_string`](Self::insert_string) with the position and window
    /// length validated up front.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `pos` does not fit in 16 bits and
    /// [`Error::BufferTooSmall`] if fewer than four bytes remain at `pos`.
    pub fn insert_string_checked(&mut self, window: &[u8], pos: usize, level: u32) -> Result<u16> {
        let marker = u16::try_from(pos)
            .map_err(|_| Error::InvalidInput(format!("position {pos} outside a 64 KiB window")))?;
        let needed = pos + 4;
        if window.len() < needed {
            return Err(Error::BufferTooSmall { needed, available: window.len() });
        }
        Ok(self.link(window, pos, marker, level))
    }

    fn link(&mut self, window: &[u8], pos: usize, marker: u16, level: u32) -> u16 {
        let h = self.bucket(window, pos, level);
        let ret = self.head[h];
        self.head[h] = marker;
        self.prev[pos & self.w_mask] = ret;
        ret
    }

    /// Most recent position in bucket `h`.
    #[must_use]
    pub fn head(&self, h: usize) -> u16 {
        self.head[h]
    }

    /// Position that preceded `pos` in its chain.
    #[must_use]
    pub fn prev(&self, pos: usize) -> u16 {
        self.prev[pos & self.w_mask]
    }

    /// Number of hash buckets.
    #[must_use]
    pub fn hash_size(&self) -> usize {
        self.head.len()
    }

    /// Empty every chain.
    pub fn clear(&mut self) {
        self.head.fill(0);
        self.prev.fill(0);
    }
}

fn multiplicative_hash(val: u32, hash_bits: u32) -> u32 {
    val.wrapping_mul(KNUTH) >> (32 - hash_bits)
}

#[cfg(target_arch = "x86_64")]
fn hardware_hash() -> Option<HashFn> {
    fn crc32c_hash(val: u32, _hash_bits: u32) -> u32 {
        // SAFETY: installed only after the SSE4.2 check in `HashChains::new`.
        unsafe { crc32c_u32(0, val) }
    }
    Some(crc32c_hash)
}

#[cfg(not(target_arch = "x86_64"))]
fn hardware_hash() -> Option<HashFn> {
    None
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.2")]
unsafe fn crc32c_u32(crc: u32, val: u32) -> u32 {
    std::arch::x86_64::_mm_crc32_u32(crc, val)
}
