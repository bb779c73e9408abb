//! Pattern mining over snippets and clusters.
//!
//! Three tiers share almost no code, so each lives in its own module and a
//! single [`mine`] dispatcher fans out over the tagged [`PatternKind`]
//! variants. Emitted patterns are ranked by descending frequency, then
//! language diversity, then snippet count.

pub mod lcs;
pub mod ngram;
pub mod structural;

use motif_core::config::MotifConfig;
use motif_core::record::{Cluster, Pattern, PatternKind, Snippet};
use tracing::info;

/// Mine one tier, or all three when `tier` is `None`, and rank the result.
pub fn mine(
    snippets: &[Snippet],
    clusters: &[Cluster],
    config: &MotifConfig,
    tier: Option<PatternKind>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();

    if matches!(tier, None | Some(PatternKind::Ngram)) {
        patterns.extend(ngram::mine(snippets, config.ngram_size, config.min_frequency));
    }
    if matches!(tier, None | Some(PatternKind::Lcs)) {
        patterns.extend(lcs::mine(snippets, clusters));
    }
    if matches!(tier, None | Some(PatternKind::Ast)) {
        patterns.extend(structural::mine(snippets, config.min_frequency));
    }

    rank(&mut patterns);
    info!(total = patterns.len(), "pattern mining complete");
    patterns
}

/// Sort by (frequency desc, language diversity desc, snippet count desc);
/// content breaks the remaining ties so output is stable.
pub fn rank(patterns: &mut [Pattern]) {
    patterns.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| b.languages.len().cmp(&a.languages.len()))
            .then_with(|| b.snippet_ids.len().cmp(&a.snippet_ids.len()))
            .then_with(|| a.content.cmp(&b.content))
    });
}
