//! LCS tier: longest common token subsequences within clusters.
//!
//! Every pair of snippets inside a cluster is compared with the standard
//! O(m·n) dynamic-programming table (quadratic within the cluster, never
//! globally). Identical subsequence content from different pairs is
//! coalesced: frequencies sum (2 per originating pair) and snippet sets
//! union.

use chrono::Utc;
use motif_core::record::{Cluster, Pattern, PatternKind, Snippet};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Subsequences shorter than this many tokens are noise.
const MIN_LCS_TOKENS: usize = 3;

/// Fixed confidence for LCS patterns, by convention.
const LCS_CONFIDENCE: f64 = 0.8;

/// Mine LCS patterns from every within-cluster snippet pair.
pub fn mine(snippets: &[Snippet], clusters: &[Cluster]) -> Vec<Pattern> {
    let by_id: HashMap<&str, &Snippet> =
        snippets.iter().map(|s| (s.id.as_str(), s)).collect();

    // One (content, pair) record per qualifying pair; clusters are
    // independent, so the pairwise work parallelises over them.
    let found: Vec<(String, [&Snippet; 2])> = clusters
        .par_iter()
        .flat_map_iter(|cluster| {
            let members: Vec<&Snippet> = cluster
                .snippet_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).copied())
                .collect();
            let mut local = Vec::new();
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    let common = lcs(&members[i].tokens, &members[j].tokens);
                    if common.len() >= MIN_LCS_TOKENS {
                        local.push((common.join(" "), [members[i], members[j]]));
                    }
                }
            }
            local
        })
        .collect();

    #[derive(Default)]
    struct Support {
        pair_count: usize,
        snippet_ids: BTreeSet<String>,
        languages: BTreeSet<String>,
    }

    let mut support: BTreeMap<String, Support> = BTreeMap::new();
    for (content, pair) in found {
        let entry = support.entry(content).or_default();
        entry.pair_count += 1;
        for snippet in pair {
            entry.snippet_ids.insert(snippet.id.clone());
            entry.languages.insert(snippet.language.clone());
        }
    }

    let now = Utc::now();
    let mut patterns = Vec::new();
    for (content, entry) in support {
        patterns.push(Pattern {
            id: format!("lcs_{:04}", patterns.len() + 1),
            kind: PatternKind::Lcs,
            content,
            frequency: 2 * entry.pair_count,
            snippet_ids: entry.snippet_ids,
            languages: entry.languages,
            confidence: LCS_CONFIDENCE,
            created_at: now,
        });
    }
    patterns
}

/// Longest common subsequence of two token slices, via the full DP table
/// and a backtrack.
fn lcs(a: &[String], b: &[String]) -> Vec<String> {
    let (m, n) = (a.len(), b.len());
    if m == 0 || n == 0 {
        return Vec::new();
    }

    // Flat (m+1)×(n+1) table of prefix LCS lengths.
    let width = n + 1;
    let mut table = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            table[i * width + j] = if a[i - 1] == b[j - 1] {
                table[(i - 1) * width + (j - 1)] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + (j - 1)])
            };
        }
    }

    let mut result = Vec::with_capacity(table[m * width + n] as usize);
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            result.push(a[i - 1].clone());
            i -= 1;
            j -= 1;
        } else if table[(i - 1) * width + j] >= table[i * width + (j - 1)] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    result.reverse();
    result
}
