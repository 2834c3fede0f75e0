//! # lzkit
//!
//! SIMD-dispatched inner loops for LZ77 codecs: back-reference expansion,
//! match-length comparison and CRC-32.
//!
//! This is the workspace root crate that re-exports [`lzkit_core`]. Depend on
//! `lzkit-core` directly to drop the umbrella.
//!
//! ## Feature Flags
//!
//! - `parallel` (default) - rayon-backed [`crc32_parallel`]
//!
//! ```
//! let mut stream = lzkit::dispatch().stream();
//! stream.update(b"12345");
//! stream.update(b"6789");
//! assert_eq!(stream.finalize(), lzkit::crc32(0, b"123456789"));
//! ```

pub use lzkit_core::*;
