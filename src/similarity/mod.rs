//! Near-duplicate detection module.
//!
//! Provides:
//! - Perceptual image hashing (DCT pHash packed into a `u64`)
//! - Hamming distance comparison against a threshold
//! - Album-wide detection persisting similarity groups

pub mod detector;
pub mod distance;
pub mod hash;

pub use detector::{
    DetectionOptions, DetectionReport, SimilarityDetector, SkipReason, SkippedObject,
};
pub use distance::{
    find_similar_pairs, hamming_distance, is_similar, similarity_score, SimilarPair,
    DEFAULT_THRESHOLD, HASH_BITS,
};
pub use hash::{hash_from_hex, hash_to_hex, ImageHasher, PerceptualHasher};
