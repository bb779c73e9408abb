//! Sub-quadratic near-duplicate detection.
//!
//! MinHash signatures estimate Jaccard similarity between token-shingle
//! sets; banded LSH buckets generate candidate pairs without pairwise
//! comparison; verified pairs become an undirected similarity graph whose
//! connected components are the clusters.

pub mod cluster;
pub mod dedup;
pub mod lsh;
pub mod minhash;

pub use cluster::{VerifiedPair, build_clusters};
pub use dedup::{DedupOutcome, dedup_snippets};
pub use lsh::LshIndex;
pub use minhash::{LshContext, SHINGLE_SIZE, estimate_jaccard, shingles};
