//! Response shapes for the HTTP surface. Field names are camelCase to match
//! the browser client.

use motif_core::record::{Cluster, Pattern, Snippet};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_snippets: usize,
    pub total_clusters: usize,
    pub total_patterns: usize,
    pub language_breakdown: BTreeMap<String, usize>,
    pub avg_cluster_size: f64,
}

#[derive(Debug, Serialize)]
pub struct ClusterView {
    pub cluster: Cluster,
    pub snippets: Vec<Snippet>,
    pub patterns: Vec<Pattern>,
    /// Leading slice of the centroid's content.
    pub preview: String,
}
