//! Engine throughput example.
//!
//! Run with: `cargo run --example crc_throughput --release [-- <backend> <MiB>]`
//!
//! Prints CRC-32, back-reference expansion and `compare256` throughput for the
//! portable engines and for the engines detected on this CPU. Set
//! `RUST_LOG=debug` to see the detection events.

use lzkit_core::benchmark::{generate_buffer, parse_backend, run_benchmark, DataPattern};
use lzkit_core::{DispatchBuilder, SimdBackend};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let requested = args.next().and_then(|s| parse_backend(&s));
    let mib: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(4);

    println!("lzkit engine throughput");
    println!("=======================\n");
    println!("Detected: {:?}\n", lzkit_core::simd::detect());

    let mut tables = vec![("portable", DispatchBuilder::new().portable())];
    match requested {
        Some(backend) => tables.push(("requested", DispatchBuilder::new().prefer_backend(backend))),
        None => tables.push(("detected", DispatchBuilder::new())),
    }

    let patterns = [
        (DataPattern::Zero, "Zero-filled"),
        (DataPattern::Text, "Text-like"),
        (DataPattern::Random, "Random"),
        (DataPattern::Mixed, "Mixed"),
    ];

    for (pattern, pattern_name) in &patterns {
        let data = generate_buffer(mib << 20, *pattern);
        println!("Pattern: {pattern_name} ({mib} MiB)");
        println!("{}", "-".repeat(72));
        println!(
            "{:>10} {:>8} {:>8} {:>12} {:>12} {:>12}",
            "Table", "Chunk", "CRC", "CRC-32", "Expand", "Compare"
        );

        for (label, builder) in &tables {
            let dispatch = match builder.clone().build() {
                Ok(dispatch) => dispatch,
                Err(e) => {
                    println!("{label:>10} Error: {e}");
                    continue;
                }
            };
            let result = run_benchmark(&dispatch, &data, 8);
            println!(
                "{:>10} {:>8} {:>8} {:>7.2} GB/s {:>7.2} GB/s {:>7.2} GB/s",
                label,
                format!("{:?}", result.backend),
                format!("{:?}", result.crc_backend),
                result.crc_throughput() / 1e9,
                result.expand_throughput() / 1e9,
                result.compare_throughput() / 1e9,
            );
        }
        println!();
    }

    if requested.is_none() && lzkit_core::simd::detect().best_backend() == SimdBackend::Scalar {
        println!("No SIMD chunk engine available on this CPU.");
    }
}
