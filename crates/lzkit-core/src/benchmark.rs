//! Throughput measurement for the dispatch engines.

use std::time::{Duration, Instant};

use crate::{CrcBackend, Dispatch, SimdBackend};

/// Data pattern for benchmark buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPattern {
    /// All zeros.
    Zero,
    /// Pseudo-random bytes.
    Random,
    /// Repeating English text.
    Text,
    /// 4 KiB blocks cycling through the other patterns.
    Mixed,
}

impl DataPattern {
    /// Parse pattern from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "zero" | "zeros" => Some(Self::Zero),
            "random" => Some(Self::Random),
            "text" => Some(Self::Text),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }
}

/// Parse a chunk engine name.
#[must_use]
pub fn parse_backend(s: &str) -> Option<SimdBackend> {
    match s.to_lowercase().as_str() {
        "scalar" | "generic" => Some(SimdBackend::Scalar),
        "sse2" => Some(SimdBackend::Sse2),
        "avx2" => Some(SimdBackend::Avx2),
        "neon" => Some(SimdBackend::Neon),
        _ => None,
    }
}

/// Timings for one dispatch table over one buffer.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Chunk engine used.
    pub backend: SimdBackend,
    /// CRC-32 engine used.
    pub crc_backend: CrcBackend,
    /// Bytes processed per pass.
    pub bytes: usize,
    /// Number of passes.
    pub iterations: usize,
    /// Time spent checksumming.
    pub crc_time: Duration,
    /// Time spent expanding back-references.
    pub expand_time: Duration,
    /// Time spent in `compare256`.
    pub compare_time: Duration,
    /// Checksum of the buffer, kept so the work cannot be optimized away.
    pub checksum: u32,
}

impl BenchmarkResult {
    fn throughput(&self, time: Duration) -> f64 {
        let secs = time.as_secs_f64();
        if secs > 0.0 {
            (self.bytes * self.iterations) as f64 / secs
        } else {
            0.0
        }
    }

    /// CRC-32 throughput in bytes per second.
    #[must_use]
    pub fn crc_throughput(&self) -> f64 {
        self.throughput(self.crc_time)
    }

    /// Back-reference expansion throughput in bytes per second.
    #[must_use]
    pub fn expand_throughput(&self) -> f64 {
        self.throughput(self.expand_time)
    }

    /// `compare256` throughput in compared bytes per second.
    #[must_use]
    pub fn compare_throughput(&self) -> f64 {
        self.throughput(self.compare_time)
    }
}

/// Generate a benchmark buffer of `len` bytes.
#[must_use]
pub fn generate_buffer(len: usize, pattern: DataPattern) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    let mut rng_state = 12345u64;

    match pattern {
        DataPattern::Zero => {}
        DataPattern::Random => fill_random(&mut buf, &mut rng_state),
        DataPattern::Text => fill_text(&mut buf, b"The quick brown fox jumps over the lazy dog. "),
        DataPattern::Mixed => {
            for (i, block) in buf.chunks_mut(4096).enumerate() {
                match i % 4 {
                    1 => fill_random(block, &mut rng_state),
                    2 => fill_text(block, b"Lorem ipsum dolor sit amet, consectetur. "),
                    3 => fill_text(block, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
                    _ => {}
                }
            }
        }
    }

    buf
}

fn fill_random(buf: &mut [u8], rng_state: &mut u64) {
    for byte in buf.iter_mut() {
        *rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        *byte = (*rng_state >> 33) as u8;
    }
}

fn fill_text(buf: &mut [u8], text: &[u8]) {
    for (j, byte) in buf.iter_mut().enumerate() {
        *byte = text[j % text.len()];
    }
}

/// Match distances replayed by the expansion benchmark.
const DISTANCES: [usize; 6] = [1, 3, 8, 17, 64, 300];
const MATCH_LEN: usize = 258;
const LITERALS: usize = 512;

/// Decode-like workload: seed the window with literals from `data`, then fill
/// the rest with back-references of varying distance.
fn expand(dispatch: &Dispatch, data: &[u8], window: &mut [u8]) {
    let seed = LITERALS.min(data.len()).min(window.len());
    window[..seed].copy_from_slice(&data[..seed]);
    let mut out = seed;
    let mut i = 0;
    while out < window.len() {
        let dist = DISTANCES[i % DISTANCES.len()].min(out);
        if dist == 0 {
            break;
        }
        let left = window.len() - out;
        out = dispatch.chunkmemset_safe(window, out, dist, MATCH_LEN, left);
        i += 1;
    }
}

/// Time CRC-32, back-reference expansion and `compare256` with the engines of
/// `dispatch`, `iterations` passes each over `data`.
#[must_use]
pub fn run_benchmark(dispatch: &Dispatch, data: &[u8], iterations: usize) -> BenchmarkResult {
    let iterations = iterations.max(1);

    let start = Instant::now();
    let mut checksum = 0;
    for _ in 0..iterations {
        checksum = dispatch.crc32(0, data);
    }
    let crc_time = start.elapsed();

    let mut window = vec![0u8; data.len()];
    let start = Instant::now();
    for _ in 0..iterations {
        expand(dispatch, data, &mut window);
    }
    let expand_time = start.elapsed();

    let start = Instant::now();
    let mut matched = 0usize;
    for _ in 0..iterations {
        if data.len() > 256 {
            for offset in (0..data.len() - 256).step_by(256) {
                let other = (offset + 1).min(data.len() - 256);
                matched += dispatch.compare256(&data[offset..], &data[other..]);
            }
        }
    }
    let compare_time = start.elapsed();
    tracing::trace!(matched, "compare256 pass complete");

    BenchmarkResult {
        backend: dispatch.backend(),
        crc_backend: dispatch.crc_backend(),
        bytes: data.len(),
        iterations,
        crc_time,
        expand_time,
        compare_time,
        checksum,
    }
}
