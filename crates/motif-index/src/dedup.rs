//! Pre-cluster de-duplication.
//!
//! Each incoming snippet is compared first by exact content hash, then by
//! LSH candidates against the already-kept set; matches above the
//! similarity threshold are dropped. Snippets are sorted by content hash
//! before the pass, so the kept set does not depend on ingest order.

use crate::lsh::LshIndex;
use crate::minhash::{LshContext, estimate_jaccard};
use motif_core::record::Snippet;
use std::collections::HashSet;
use tracing::debug;

/// Result of the de-dup pass.
#[derive(Debug)]
pub struct DedupOutcome {
    /// Surviving snippets, in content-hash order.
    pub kept: Vec<Snippet>,
    pub dropped_exact: usize,
    pub dropped_near: usize,
}

/// Drop exact and near duplicates, keeping the first occurrence in
/// content-hash order.
pub fn dedup_snippets(
    mut snippets: Vec<Snippet>,
    ctx: &LshContext,
    threshold: f64,
) -> DedupOutcome {
    snippets.sort_by(|a, b| a.content_hash.cmp(&b.content_hash));

    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut index = LshIndex::new(ctx);
    let mut kept = Vec::new();
    let mut dropped_exact = 0;
    let mut dropped_near = 0;

    for snippet in snippets {
        if !seen_hashes.insert(snippet.content_hash.clone()) {
            dropped_exact += 1;
            continue;
        }

        let near_match = index
            .query(&snippet.signature)
            .into_iter()
            .any(|entry| estimate_jaccard(index.signature(entry), &snippet.signature) >= threshold);
        if near_match {
            dropped_near += 1;
            continue;
        }

        index.insert(snippet.id.clone(), snippet.signature.clone());
        kept.push(snippet);
    }

    debug!(
        kept = kept.len(),
        dropped_exact, dropped_near, "de-dup pass complete"
    );

    DedupOutcome {
        kept,
        dropped_exact,
        dropped_near,
    }
}
