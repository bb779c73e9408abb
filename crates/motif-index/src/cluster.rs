//! Connected-component clustering over verified similar pairs.

use crate::minhash::estimate_jaccard;
use chrono::Utc;
use motif_core::record::{Cluster, Snippet};
use std::collections::{BTreeSet, HashMap, HashSet};

/// One similarity-graph edge: a candidate pair that passed verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPair {
    pub a: String,
    pub b: String,
    pub similarity: f64,
}

/// Build clusters from the similarity graph induced by `pairs`.
///
/// Components are discovered by iterative DFS, seeded in snippet order, so
/// cluster labels are deterministic for a fixed input ordering. Components
/// below `min_cluster_size` are dropped; singletons are kept only when
/// `keep_singletons` is set (with similarity 1.0 by convention).
pub fn build_clusters(
    snippets: &[Snippet],
    pairs: &[VerifiedPair],
    min_cluster_size: usize,
    keep_singletons: bool,
) -> Vec<Cluster> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for pair in pairs {
        adjacency.entry(&pair.a).or_default().push(&pair.b);
        adjacency.entry(&pair.b).or_default().push(&pair.a);
    }

    let signatures: HashMap<&str, &[u32]> = snippets
        .iter()
        .map(|s| (s.id.as_str(), s.signature.as_slice()))
        .collect();
    let languages: HashMap<&str, &str> = snippets
        .iter()
        .map(|s| (s.id.as_str(), s.language.as_str()))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut clusters = Vec::new();

    for seed in snippets {
        if visited.contains(seed.id.as_str()) {
            continue;
        }
        let members = collect_component(seed.id.as_str(), &adjacency, &mut visited);

        let emit = members.len() >= min_cluster_size
            || (members.len() == 1 && keep_singletons);
        if !emit {
            continue;
        }

        // Keep member_sigs index-aligned with members; an id missing from
        // the snippet slice contributes an empty signature (estimates 0).
        let member_sigs: Vec<&[u32]> = members
            .iter()
            .map(|id| signatures.get(id).copied().unwrap_or(&[]))
            .collect();
        let (centroid_idx, similarity) = centroid_of(&member_sigs);

        let language_set: BTreeSet<String> = members
            .iter()
            .filter_map(|id| languages.get(id))
            .map(|lang| (*lang).to_string())
            .collect();

        clusters.push(Cluster {
            id: format!("cluster_{:04}", clusters.len() + 1),
            centroid_id: members[centroid_idx].to_string(),
            snippet_ids: members.iter().map(|id| (*id).to_string()).collect(),
            similarity,
            languages: language_set,
            created_at: Utc::now(),
        });
    }

    clusters
}

/// Iterative DFS from `seed`; returns members in discovery order.
fn collect_component<'a>(
    seed: &'a str,
    adjacency: &HashMap<&str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
) -> Vec<&'a str> {
    let mut members = Vec::new();
    let mut stack = vec![seed];
    visited.insert(seed);
    while let Some(current) = stack.pop() {
        members.push(current);
        if let Some(neighbours) = adjacency.get(current) {
            for &next in neighbours {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    members
}

/// Index of the member maximising mean Jaccard to all other members (ties
/// broken by first occurrence), plus the mean pairwise similarity of the
/// component. Singletons score 1.0 by convention.
fn centroid_of(signatures: &[&[u32]]) -> (usize, f64) {
    let n = signatures.len();
    if n <= 1 {
        return (0, 1.0);
    }

    let mut best_idx = 0;
    let mut best_mean = f64::MIN;
    let mut pair_sum = 0.0;

    for (i, sig) in signatures.iter().enumerate() {
        let mut row_sum = 0.0;
        for (j, other) in signatures.iter().enumerate() {
            if i == j {
                continue;
            }
            let similarity = estimate_jaccard(sig, other);
            row_sum += similarity;
            if i < j {
                pair_sum += similarity;
            }
        }
        let mean = row_sum / (n - 1) as f64;
        if mean > best_mean {
            best_mean = mean;
            best_idx = i;
        }
    }

    let pair_count = (n * (n - 1) / 2) as f64;
    (best_idx, pair_sum / pair_count)
}
