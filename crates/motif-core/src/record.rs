//! Record data model for the three datasets.
//!
//! Identifiers are opaque strings, unique within their dataset. The
//! cluster→snippet relation is by id only; clusters never hold snippet
//! records directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// A record that can be looked up by id in its log.
pub trait Record: Serialize + DeserializeOwned {
    fn id(&self) -> &str;
}

/// A code fragment extracted from a source file.
///
/// Created during ingest; mutated at most once afterwards, to attach a
/// cluster id during indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    /// Raw fragment text, exactly as it appears in the file.
    pub content: String,
    /// Detected language tag (closed vocabulary, or "unknown").
    pub language: String,
    /// Originating file path.
    pub file: String,
    /// Inclusive 1-based line range.
    pub line_start: usize,
    pub line_end: usize,
    /// SHA-256 of the raw content, hex-encoded.
    pub content_hash: String,
    /// Normalised token sequence, in source order.
    pub tokens: Vec<String>,
    /// MinHash signature; length = bands × rows_per_band.
    pub signature: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Snippet {
    fn id(&self) -> &str {
        &self.id
    }
}

/// An equivalence class of similar snippets.
///
/// Members are connected through similarity-graph edges; a pair of members
/// is not individually required to pass the edge threshold, only to be
/// transitively connected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    /// Member ids in component discovery order.
    pub snippet_ids: Vec<String>,
    /// Member maximising mean intra-cluster similarity.
    pub centroid_id: String,
    /// Mean pairwise Jaccard estimate within the cluster (1.0 for singletons).
    pub similarity: f64,
    pub languages: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Cluster {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.snippet_ids.len()
    }
}

/// Pattern mining tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Ngram,
    Lcs,
    Ast,
}

impl PatternKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ngram => "ngram",
            Self::Lcs => "lcs",
            Self::Ast => "ast",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ngram" => Some(Self::Ngram),
            "lcs" => Some(Self::Lcs),
            "ast" => Some(Self::Ast),
            _ => None,
        }
    }
}

/// A recurring token sequence or structural shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PatternKind,
    /// Textual form: the token run, common subsequence, or canonical tag.
    pub content: String,
    pub frequency: usize,
    pub snippet_ids: BTreeSet<String>,
    pub languages: BTreeSet<String>,
    /// Cross-snippet support score in [0, 1].
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl Record for Pattern {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Per-run counters persisted after `index`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexStats {
    pub snippets_scanned: usize,
    pub exact_duplicates_dropped: usize,
    pub near_duplicates_dropped: usize,
    pub candidate_pairs: usize,
    pub verified_pairs: usize,
    pub clusters_emitted: usize,
    pub clustered_snippets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Per-run counters persisted after `synth`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisStats {
    pub snippets: usize,
    pub clusters: usize,
    pub ngram_patterns: usize,
    pub lcs_patterns: usize,
    pub ast_patterns: usize,
    pub total_emitted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// SHA-256 of a snippet's raw content, hex-encoded.
pub fn content_hash(content: &str) -> String {
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Build a snippet id from its provenance. Opaque to everything downstream;
/// the hash prefix keeps ids unique when the same file is ingested twice
/// under different roots.
pub fn snippet_id(file: &str, line_start: usize, line_end: usize, hash: &str) -> String {
    format!("{file}:{line_start}-{line_end}:{}", &hash[..8.min(hash.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_sha256_hex() {
        let hash = content_hash("function add(a,b){ return a+b }");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Identical content hashes identically
        assert_eq!(hash, content_hash("function add(a,b){ return a+b }"));
        assert_ne!(hash, content_hash("function add(a,b){ return a-b }"));
    }

    #[test]
    fn test_snippet_id_embeds_provenance() {
        let hash = content_hash("x");
        let id = snippet_id("src/a.js", 3, 9, &hash);
        assert!(id.starts_with("src/a.js:3-9:"));
        assert!(id.ends_with(&hash[..8]));
    }

    #[test]
    fn test_pattern_kind_roundtrip() {
        for kind in [PatternKind::Ngram, PatternKind::Lcs, PatternKind::Ast] {
            assert_eq!(PatternKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PatternKind::from_name("tree"), None);
    }

    #[test]
    fn test_pattern_kind_serializes_as_type_field() {
        let pattern = Pattern {
            id: "ngram_0001".to_string(),
            kind: PatternKind::Ngram,
            content: "if err return".to_string(),
            frequency: 2,
            snippet_ids: BTreeSet::new(),
            languages: BTreeSet::new(),
            confidence: 0.5,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&pattern).unwrap();
        assert_eq!(json["type"], "ngram");
    }
}
