//! Property-based tests for invariants

use lzkit::crc32::crc32_bytewise;
use lzkit::{chunkmemset_safe, crc32, crc32_combine};
use proptest::prelude::*;

proptest! {
    #[test]
    fn dispatched_crc_matches_bytewise(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        prop_assert_eq!(crc32(0, &data), crc32_bytewise(0, &data));
    }

    #[test]
    fn combine_is_associative(
        a in proptest::collection::vec(any::<u8>(), 0..200),
        b in proptest::collection::vec(any::<u8>(), 0..200),
        c in proptest::collection::vec(any::<u8>(), 0..200),
    ) {
        let (ca, cb, cc) = (crc32(0, &a), crc32(0, &b), crc32(0, &c));
        let (lb, lc) = (b.len() as u64, c.len() as u64);
        let left = crc32_combine(crc32_combine(ca, cb, lb), cc, lc);
        let right = crc32_combine(ca, crc32_combine(cb, cc, lc), lb + lc);
        prop_assert_eq!(left, right);
    }

    #[test]
    fn expansion_is_periodic(
        pattern in proptest::collection::vec(any::<u8>(), 1..40),
        len in 0usize..500,
    ) {
        let dist = pattern.len();
        let mut window = pattern.clone();
        window.resize(dist + 500, 0);
        let end = chunkmemset_safe(&mut window, dist, dist, len, 500);
        prop_assert_eq!(end, dist + len);
        for i in dist..end {
            prop_assert_eq!(window[i], pattern[i % dist]);
        }
    }
}
