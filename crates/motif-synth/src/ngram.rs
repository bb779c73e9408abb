//! N-gram tier: recurring token runs.

use chrono::Utc;
use motif_core::record::{Pattern, PatternKind, Snippet};
use std::collections::{BTreeMap, BTreeSet};

/// Slide a length-`n` window over every snippet's token sequence and emit
/// the runs supported by at least `min_frequency` distinct snippets.
/// Frequency is the distinct-snippet count, so a run repeated inside one
/// snippet counts once.
pub fn mine(snippets: &[Snippet], ngram_size: usize, min_frequency: usize) -> Vec<Pattern> {
    if ngram_size == 0 {
        return Vec::new();
    }

    #[derive(Default)]
    struct Support {
        snippet_ids: BTreeSet<String>,
        languages: BTreeSet<String>,
    }

    let mut support: BTreeMap<String, Support> = BTreeMap::new();
    for snippet in snippets {
        if snippet.tokens.len() < ngram_size {
            continue;
        }
        for window in snippet.tokens.windows(ngram_size) {
            let entry = support.entry(window.join(" ")).or_default();
            entry.snippet_ids.insert(snippet.id.clone());
            entry.languages.insert(snippet.language.clone());
        }
    }

    let total = snippets.len();
    let now = Utc::now();
    let mut patterns = Vec::new();
    for (content, entry) in support {
        if entry.snippet_ids.len() < min_frequency {
            continue;
        }
        let frequency = entry.snippet_ids.len();
        patterns.push(Pattern {
            id: format!("ngram_{:04}", patterns.len() + 1),
            kind: PatternKind::Ngram,
            content,
            frequency,
            confidence: if total == 0 {
                0.0
            } else {
                frequency as f64 / total as f64
            },
            snippet_ids: entry.snippet_ids,
            languages: entry.languages,
            created_at: now,
        });
    }
    patterns
}
