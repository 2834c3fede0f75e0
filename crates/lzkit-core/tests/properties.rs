//! Property tests: every engine must agree with the byte-at-a-time reference.

use lzkit_core::crc32::{crc32_big, crc32_bytewise, crc32_generic, crc32_little};
use lzkit_core::{
    compare256, crc32, crc32_chunks, crc32_combine, crc32_combine_gen, crc32_combine_op, ChunkOps, CrcBackend,
    DispatchBuilder, SimdBackend,
};
use proptest::prelude::*;

fn chunk_engines() -> Vec<ChunkOps> {
    [SimdBackend::Scalar, SimdBackend::Sse2, SimdBackend::Avx2, SimdBackend::Neon]
        .into_iter()
        .filter_map(ChunkOps::for_backend)
        .collect()
}

fn expand_reference(window: &mut [u8], dst: usize, dist: usize, len: usize) {
    for i in dst..dst + len {
        window[i] = window[i - dist];
    }
}

proptest! {
    #[test]
    fn crc_engines_agree(data in proptest::collection::vec(any::<u8>(), 0..2048), seed in any::<u32>()) {
        let expected = crc32_bytewise(seed, &data);
        prop_assert_eq!(crc32_little(seed, &data), expected);
        prop_assert_eq!(crc32_big(seed, &data), expected);
        prop_assert_eq!(crc32_generic(seed, &data), expected);
        prop_assert_eq!(crc32(seed, &data), expected);
        for backend in [CrcBackend::Pclmul, CrcBackend::Armv8] {
            if let Ok(dispatch) = DispatchBuilder::new().prefer_crc(backend).build() {
                prop_assert_eq!(dispatch.crc32(seed, &data), expected, "{:?}", backend);
            }
        }
    }

    #[test]
    fn crc_resumes_at_any_split(
        data in proptest::collection::vec(any::<u8>(), 1..1024),
        cut in any::<prop::sample::Index>(),
    ) {
        let cut = cut.index(data.len());
        let (a, b) = data.split_at(cut);
        prop_assert_eq!(crc32(crc32(0, a), b), crc32(0, &data));
    }

    #[test]
    fn combine_matches_concatenation(
        a in proptest::collection::vec(any::<u8>(), 0..512),
        b in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let whole: Vec<u8> = a.iter().chain(&b).copied().collect();
        let (ca, cb) = (crc32(0, &a), crc32(0, &b));
        prop_assert_eq!(crc32_combine(ca, cb, b.len() as u64), crc32(0, &whole));
        prop_assert_eq!(crc32_combine_op(ca, cb, crc32_combine_gen(b.len() as u64)), crc32(0, &whole));
    }

    #[test]
    fn chunks_match_whole(data in proptest::collection::vec(any::<u8>(), 0..4096), piece in 1usize..700) {
        prop_assert_eq!(crc32_chunks(0, data.chunks(piece)), crc32(0, &data));
    }

    #[test]
    fn stream_matches_one_shot(data in proptest::collection::vec(any::<u8>(), 0..3000), piece in 1usize..300) {
        let mut stream = lzkit_core::dispatch().stream();
        let mut out = vec![0u8; data.len()];
        for (i, src) in data.chunks(piece).enumerate() {
            if i % 2 == 0 {
                stream.update(src);
                out[i * piece..i * piece + src.len()].copy_from_slice(src);
            } else {
                stream.copy_with_crc(&mut out[i * piece..], src).unwrap();
            }
        }
        prop_assert_eq!(&out, &data);
        prop_assert_eq!(stream.finalize(), crc32(0, &data));
    }

    #[test]
    fn compare256_finds_first_mismatch(
        a in proptest::collection::vec(any::<u8>(), 256..300),
        at in 0usize..300,
        flip in 1u8..=255,
    ) {
        let mut b = a.clone();
        if at < b.len() {
            b[at] ^= flip;
        }
        let expected = at.min(256);
        prop_assert_eq!(compare256(&a, &b), expected);
        for backend in [SimdBackend::Scalar, SimdBackend::Sse2, SimdBackend::Avx2] {
            if let Ok(dispatch) = DispatchBuilder::new().prefer_backend(backend).build() {
                prop_assert_eq!(dispatch.compare256(&a, &b), expected);
            }
        }
    }

    #[test]
    fn memset_fill_safe_matches_reference(
        seed in proptest::collection::vec(any::<u8>(), 1..80),
        dist_pick in any::<prop::sample::Index>(),
        len in 0usize..400,
        left in 0usize..400,
    ) {
        let dst = seed.len();
        let dist = dist_pick.index(dst) + 1;
        let mut expected = seed.clone();
        expected.resize(dst + 400, 0);
        expand_reference(&mut expected, dst, dist, len.min(left));

        for ops in chunk_engines() {
            let mut window = seed.clone();
            window.resize(dst + 400, 0);
            let end = ops.memset_fill_safe(&mut window, dst, dist, len, left);
            prop_assert_eq!(end, dst + len.min(left), "{:?}", ops.backend());
            prop_assert_eq!(&window, &expected, "{:?} dist={}", ops.backend(), dist);
        }
    }

    #[test]
    fn copy_safe_matches_reference(
        seed in proptest::collection::vec(any::<u8>(), 1..100),
        src_pick in any::<prop::sample::Index>(),
        len in 0usize..300,
        slack in 0usize..300,
    ) {
        let dst = seed.len();
        let src = src_pick.index(dst);
        let total = dst + 300;
        let safe = (dst + slack).min(total - 1);
        let n = len.min(safe + 1 - dst);

        let mut expected = seed.clone();
        expected.resize(total, 0xaa);
        expand_reference(&mut expected, dst, dst - src, n);

        for ops in chunk_engines() {
            let mut window = seed.clone();
            window.resize(total, 0xaa);
            let end = ops.copy_safe(&mut window, dst, src, len, safe);
            prop_assert_eq!(end, dst + n, "{:?}", ops.backend());
            prop_assert_eq!(&window, &expected, "{:?} src={} dst={}", ops.backend(), src, dst);
        }
    }
}

#[test]
fn detection_is_stable_across_threads() {
    let first = lzkit_core::simd::detect();
    let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(lzkit_core::simd::detect)).collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), first);
    }
    let tables: Vec<_> =
        (0..4).map(|_| std::thread::spawn(|| lzkit_core::dispatch() as *const _ as usize)).collect();
    let addr = lzkit_core::dispatch() as *const _ as usize;
    for handle in tables {
        assert_eq!(handle.join().unwrap(), addr);
    }
}
