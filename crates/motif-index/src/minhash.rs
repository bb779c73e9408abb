//! MinHash signature generation.
//!
//! K = bands × rows hash functions of the form
//! `h(s) = (a·poly31(s) + b) mod p` with `p = 2³¹ − 1`. The probability two
//! signatures agree at a position equals the Jaccard similarity of their
//! shingle sets. The coefficient family is fixed per context; signatures
//! are not comparable across different seeds.

use motif_core::config::MotifConfig;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::collections::HashSet;

/// Shingle length in tokens.
pub const SHINGLE_SIZE: usize = 3;

/// Mersenne prime 2³¹ − 1.
const MODULUS: u64 = (1 << 31) - 1;

/// Signature value for an empty shingle set (fewer tokens than the shingle
/// window). Two empty sets therefore estimate as identical.
const EMPTY_SENTINEL: u32 = u32::MAX;

/// The hash family for one run. Passed explicitly to every component that
/// computes signatures; never stashed in module state.
#[derive(Debug, Clone)]
pub struct LshContext {
    bands: usize,
    rows: usize,
    coefficients: Vec<(u64, u64)>,
}

impl LshContext {
    /// Draw a `bands × rows` hash family from a deterministic seed.
    pub fn new(bands: usize, rows: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let coefficients = (0..bands * rows)
            .map(|_| {
                (
                    rng.random_range(1..MODULUS),
                    rng.random_range(0..MODULUS),
                )
            })
            .collect();
        Self {
            bands,
            rows,
            coefficients,
        }
    }

    pub fn from_config(config: &MotifConfig) -> Self {
        Self::new(config.bands, config.rows_per_band, config.seed)
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn signature_len(&self) -> usize {
        self.bands * self.rows
    }

    /// MinHash signature of a token sequence's shingle set.
    pub fn signature(&self, tokens: &[String]) -> Vec<u32> {
        let shingle_set = shingles(tokens, SHINGLE_SIZE);
        if shingle_set.is_empty() {
            return vec![EMPTY_SENTINEL; self.signature_len()];
        }

        let shingle_hashes: Vec<u64> = shingle_set.iter().map(|s| poly31(s)).collect();
        self.coefficients
            .iter()
            .map(|&(a, b)| {
                let minimum = shingle_hashes
                    .iter()
                    .map(|&h| (a * h + b) % MODULUS)
                    .min()
                    .unwrap_or(u64::from(EMPTY_SENTINEL));
                minimum as u32
            })
            .collect()
    }

    /// Bucket key for one band of a signature: a deterministic fold of the
    /// band's entries. Keys are only meaningful within one process run.
    pub fn band_key(&self, signature: &[u32], band: usize) -> u64 {
        let start = band * self.rows;
        signature[start..start + self.rows]
            .iter()
            .fold(1_469_598_103u64, |acc, &v| {
                acc.wrapping_mul(1_000_003).wrapping_add(u64::from(v))
            })
    }
}

/// The set of `size`-token contiguous shingles, joined by single spaces.
pub fn shingles(tokens: &[String], size: usize) -> HashSet<String> {
    if size == 0 || tokens.len() < size {
        return HashSet::new();
    }
    tokens.windows(size).map(|window| window.join(" ")).collect()
}

/// Polynomial rolling hash with base 31, mod 2³¹ − 1.
fn poly31(s: &str) -> u64 {
    s.chars()
        .fold(0u64, |acc, c| (acc * 31 + u64::from(c as u32)) % MODULUS)
}

/// Estimated Jaccard similarity: the fraction of signature positions that
/// agree. Length mismatch (signatures from different configs) estimates 0.
pub fn estimate_jaccard(a: &[u32], b: &[u32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let matching = a.iter().zip(b).filter(|(x, y)| x == y).count();
    matching as f64 / a.len() as f64
}
