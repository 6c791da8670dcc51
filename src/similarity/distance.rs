//! Hamming distance comparison of perceptual hashes.

/// Number of bits in a hash.
pub const HASH_BITS: u32 = 64;

/// Default similarity threshold: pairs closer than 20 bits are similar.
pub const DEFAULT_THRESHOLD: u32 = 20;

/// Count of differing bits between two hashes.
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// True when `distance` is strictly below `threshold`.
pub fn is_similar(distance: u32, threshold: u32) -> bool {
    distance < threshold
}

/// Score stored with a membership: identical hashes score 100.
pub fn similarity_score(distance: u32) -> u32 {
    100 - distance.min(HASH_BITS)
}

/// Two hashed entries judged similar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarPair<K> {
    pub left: K,
    pub right: K,
    pub distance: u32,
}

/// Scan every unordered pair of `hashes` and keep those below `threshold`.
///
/// Pairs are reported with `left` preceding `right` in the input order.
pub fn find_similar_pairs<K: Clone>(hashes: &[(K, u64)], threshold: u32) -> Vec<SimilarPair<K>> {
    let mut pairs = Vec::new();

    for (i, (left, left_hash)) in hashes.iter().enumerate() {
        for (right, right_hash) in &hashes[i + 1..] {
            let distance = hamming_distance(*left_hash, *right_hash);
            if is_similar(distance, threshold) {
                pairs.push(SimilarPair {
                    left: left.clone(),
                    right: right.clone(),
                    distance,
                });
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [u64; 6] = [
        0,
        1,
        u64::MAX,
        0xdead_beef_cafe_f00d,
        0x0123_4567_89ab_cdef,
        0x8000_0000_0000_0000,
    ];

    #[test]
    fn test_distance_properties() {
        for &a in &SAMPLES {
            assert_eq!(hamming_distance(a, a), 0);
            for &b in &SAMPLES {
                let d = hamming_distance(a, b);
                assert_eq!(d, hamming_distance(b, a));
                assert!(d <= HASH_BITS);
            }
        }
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(hamming_distance(0, 1), 1);
        assert_eq!(hamming_distance(0, u64::MAX), 64);
        assert_eq!(hamming_distance(0b1010, 0b0101), 4);
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(is_similar(19, 20));
        assert!(!is_similar(20, 20));
        assert!(!is_similar(0, 0));
    }

    #[test]
    fn test_threshold_monotonicity() {
        for d in 0..=HASH_BITS {
            for t in 0..=HASH_BITS {
                if is_similar(d, t) {
                    assert!(is_similar(d, t + 1));
                }
            }
        }
    }

    #[test]
    fn test_similarity_score() {
        assert_eq!(similarity_score(0), 100);
        assert_eq!(similarity_score(1), 99);
        assert_eq!(similarity_score(20), 80);
        assert_eq!(similarity_score(64), 36);
    }

    #[test]
    fn test_find_similar_pairs() {
        let hashes = vec![("a", 0u64), ("b", 1), ("c", u64::MAX)];
        let pairs = find_similar_pairs(&hashes, DEFAULT_THRESHOLD);
        assert_eq!(
            pairs,
            vec![SimilarPair {
                left: "a",
                right: "b",
                distance: 1
            }]
        );
    }

    #[test]
    fn test_find_similar_pairs_all_pairs() {
        let hashes = vec![(1, 0u64), (2, 0), (3, 0), (4, 0)];
        assert_eq!(find_similar_pairs(&hashes, DEFAULT_THRESHOLD).len(), 6);
        assert!(find_similar_pairs(&hashes[..1], DEFAULT_THRESHOLD).is_empty());
    }
}
