//! Banded LSH bucketing and candidate generation.
//!
//! Signatures are split into `bands` contiguous groups of `rows` entries;
//! two snippets become candidates when any band hashes to the same bucket.
//! Bucket iteration is first-touch order and pair emission is
//! bucket-then-pair, which fixes downstream cluster labelling.

use crate::cluster::VerifiedPair;
use crate::minhash::{LshContext, estimate_jaccard};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// In-memory, per-run, single-owner candidate index.
pub struct LshIndex<'a> {
    ctx: &'a LshContext,
    ids: Vec<String>,
    signatures: Vec<Vec<u32>>,
    buckets: HashMap<(usize, u64), Vec<usize>>,
    bucket_order: Vec<(usize, u64)>,
}

impl<'a> LshIndex<'a> {
    pub fn new(ctx: &'a LshContext) -> Self {
        Self {
            ctx,
            ids: Vec::new(),
            signatures: Vec::new(),
            buckets: HashMap::new(),
            bucket_order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, entry: usize) -> &str {
        &self.ids[entry]
    }

    pub fn signature(&self, entry: usize) -> &[u32] {
        &self.signatures[entry]
    }

    /// Insert one signature; O(bands).
    pub fn insert(&mut self, id: String, signature: Vec<u32>) {
        debug_assert_eq!(signature.len(), self.ctx.signature_len());
        let entry = self.ids.len();
        for band in 0..self.ctx.bands() {
            let key = (band, self.ctx.band_key(&signature, band));
            let bucket = self.buckets.entry(key).or_insert_with(|| {
                self.bucket_order.push(key);
                Vec::new()
            });
            bucket.push(entry);
        }
        self.ids.push(id);
        self.signatures.push(signature);
    }

    /// Entries sharing at least one bucket with the probe signature,
    /// without inserting it. Used by the de-dup pass.
    pub fn query(&self, signature: &[u32]) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for band in 0..self.ctx.bands() {
            let key = (band, self.ctx.band_key(signature, band));
            if let Some(bucket) = self.buckets.get(&key) {
                for &entry in bucket {
                    if seen.insert(entry) {
                        matches.push(entry);
                    }
                }
            }
        }
        matches
    }

    /// All distinct pairs drawn from buckets with at least two members, in
    /// bucket-then-pair order.
    pub fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for key in &self.bucket_order {
            let bucket = &self.buckets[key];
            if bucket.len() < 2 {
                continue;
            }
            for i in 0..bucket.len() {
                for j in (i + 1)..bucket.len() {
                    let pair = (bucket[i].min(bucket[j]), bucket[i].max(bucket[j]));
                    if seen.insert(pair) {
                        pairs.push(pair);
                    }
                }
            }
        }
        pairs
    }

    /// Candidate pairs whose full-signature Jaccard estimate passes the
    /// threshold. Verification compares every signature position, not the
    /// bucket match. Parallel over pairs; emission order is preserved.
    pub fn verified_pairs(&self, threshold: f64) -> Vec<VerifiedPair> {
        self.verify(&self.candidate_pairs(), threshold)
    }

    /// Verify an explicit candidate list (entry-index pairs from
    /// [`Self::candidate_pairs`]).
    pub fn verify(&self, candidates: &[(usize, usize)], threshold: f64) -> Vec<VerifiedPair> {
        candidates
            .par_iter()
            .filter_map(|&(a, b)| {
                let similarity = estimate_jaccard(&self.signatures[a], &self.signatures[b]);
                (similarity >= threshold).then(|| VerifiedPair {
                    a: self.ids[a].clone(),
                    b: self.ids[b].clone(),
                    similarity,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_identical_signatures_become_candidates() {
        let ctx = LshContext::new(8, 4, 11);
        let mut index = LshIndex::new(&ctx);
        let toks = tokens(&["alpha", "beta", "gamma", "delta", "epsilon"]);
        index.insert("a".to_string(), ctx.signature(&toks));
        index.insert("b".to_string(), ctx.signature(&toks));

        let pairs = index.candidate_pairs();
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_dissimilar_signatures_rarely_collide_and_fail_verification() {
        let ctx = LshContext::new(8, 4, 11);
        let mut index = LshIndex::new(&ctx);
        index.insert(
            "a".to_string(),
            ctx.signature(&tokens(&["alpha", "beta", "gamma", "delta", "epsilon"])),
        );
        index.insert(
            "b".to_string(),
            ctx.signature(&tokens(&["one", "two", "three", "four", "five"])),
        );

        // Whatever the buckets did, verification must reject the pair.
        assert!(index.verified_pairs(0.7).is_empty());
    }

    #[test]
    fn test_verified_pair_carries_estimate() {
        let ctx = LshContext::new(8, 4, 11);
        let mut index = LshIndex::new(&ctx);
        let toks = tokens(&["func", "parse", "header", "return", "header"]);
        index.insert("x".to_string(), ctx.signature(&toks));
        index.insert("y".to_string(), ctx.signature(&toks));

        let verified = index.verified_pairs(0.8);
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].a, "x");
        assert_eq!(verified[0].b, "y");
        assert_eq!(verified[0].similarity, 1.0);
    }

    #[test]
    fn test_query_finds_bucket_mates_without_inserting() {
        let ctx = LshContext::new(8, 4, 11);
        let mut index = LshIndex::new(&ctx);
        let toks = tokens(&["request", "body", "parse", "validate", "store"]);
        index.insert("kept".to_string(), ctx.signature(&toks));

        let probe = ctx.signature(&toks);
        let matches = index.query(&probe);
        assert_eq!(matches, vec![0]);
        assert_eq!(index.len(), 1, "query must not insert");
    }

    #[test]
    fn test_pair_order_is_deterministic() {
        let ctx = LshContext::new(8, 4, 11);
        let toks_one = tokens(&["alpha", "beta", "gamma", "delta"]);
        let toks_two = tokens(&["one", "two", "three", "four"]);

        let mut first = LshIndex::new(&ctx);
        let mut second = LshIndex::new(&ctx);
        for index in [&mut first, &mut second] {
            index.insert("a".to_string(), ctx.signature(&toks_one));
            index.insert("b".to_string(), ctx.signature(&toks_one));
            index.insert("c".to_string(), ctx.signature(&toks_two));
            index.insert("d".to_string(), ctx.signature(&toks_two));
        }
        assert_eq!(first.candidate_pairs(), second.candidate_pairs());
    }
}
