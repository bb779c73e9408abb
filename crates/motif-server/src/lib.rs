//! Read-only HTTP API over the store.
//!
//! The server never mutates: every handler reads through [`Store`] and
//! assembles a view. Mining happens exclusively through the CLI verbs.

pub mod views;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use motif_core::record::{Cluster, Pattern, PatternKind, Snippet};
use motif_core::store::{Dataset, Store};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use views::{ClusterView, StatsView};

/// Patterns responses are capped at this many entries.
const PATTERN_CAP: usize = 100;

/// Characters of centroid content shown in cluster previews.
const PREVIEW_CHARS: usize = 200;

struct AppState {
    store: Store,
}

/// Bind and serve until the process is stopped.
pub async fn serve(store: Store, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(store);
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    info!(host, port, "serving datasets");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(store: Store) -> Router {
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/clusters", get(get_clusters))
        .route("/api/clusters/{id}", get(get_cluster))
        .route("/api/snippets/{id}", get(get_snippet))
        .route("/api/patterns", get(get_patterns))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(AppState { store }))
}

/// Handler failures: storage errors surface as 500, lookups as 404, bad
/// query parameters as 400.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<motif_core::MotifError> for ApiError {
    fn from(err: motif_core::MotifError) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsView>, ApiError> {
    Ok(Json(fetch_stats(&state.store)?))
}

async fn get_clusters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClusterView>>, ApiError> {
    Ok(Json(fetch_cluster_views(&state.store, None)?))
}

async fn get_cluster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClusterView>, ApiError> {
    fetch_cluster_views(&state.store, Some(&id))?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("no cluster '{id}'")))
}

async fn get_snippet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Snippet>, ApiError> {
    state
        .store
        .get_by_id::<Snippet>(Dataset::Snippets, &id)?
        .map(Json)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("no snippet '{id}'")))
}

#[derive(Debug, Deserialize)]
struct PatternsQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn get_patterns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatternsQuery>,
) -> Result<Json<Vec<Pattern>>, ApiError> {
    let kind = match query.kind.as_deref() {
        None => None,
        Some(name) => Some(PatternKind::from_name(name).ok_or_else(|| {
            ApiError(
                StatusCode::BAD_REQUEST,
                format!("unknown pattern type '{name}'"),
            )
        })?),
    };
    Ok(Json(fetch_patterns(&state.store, kind)?))
}

/// Corpus-wide counters for the dashboard.
pub fn fetch_stats(store: &Store) -> motif_core::Result<StatsView> {
    let mut total_snippets = 0;
    let mut language_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for snippet in store.scan::<Snippet>(Dataset::Snippets)? {
        total_snippets += 1;
        *language_breakdown.entry(snippet.language).or_insert(0) += 1;
    }

    let clusters: Vec<Cluster> = store.scan_all(Dataset::Clusters)?;
    let member_total: usize = clusters.iter().map(Cluster::size).sum();
    let avg_cluster_size = if clusters.is_empty() {
        0.0
    } else {
        member_total as f64 / clusters.len() as f64
    };

    Ok(StatsView {
        total_snippets,
        total_clusters: clusters.len(),
        total_patterns: store.scan::<Pattern>(Dataset::Patterns)?.count(),
        language_breakdown,
        avg_cluster_size,
    })
}

/// Assemble cluster views, optionally restricted to one cluster id.
pub fn fetch_cluster_views(
    store: &Store,
    only: Option<&str>,
) -> motif_core::Result<Vec<ClusterView>> {
    let clusters: Vec<Cluster> = store
        .scan::<Cluster>(Dataset::Clusters)?
        .filter(|c| only.is_none_or(|id| c.id == id))
        .collect();
    if clusters.is_empty() {
        return Ok(Vec::new());
    }

    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets)?;
    let patterns: Vec<Pattern> = store.scan_all(Dataset::Patterns)?;

    let views = clusters
        .into_iter()
        .map(|cluster| {
            let members: Vec<Snippet> = snippets
                .iter()
                .filter(|s| cluster.snippet_ids.contains(&s.id))
                .cloned()
                .collect();
            let related: Vec<Pattern> = patterns
                .iter()
                .filter(|p| cluster.snippet_ids.iter().any(|id| p.snippet_ids.contains(id)))
                .cloned()
                .collect();
            let preview = members
                .iter()
                .find(|s| s.id == cluster.centroid_id)
                .map(|s| truncate_chars(&s.content, PREVIEW_CHARS))
                .unwrap_or_default();
            ClusterView {
                cluster,
                snippets: members,
                patterns: related,
                preview,
            }
        })
        .collect();
    Ok(views)
}

/// Patterns sorted by frequency·confidence, optionally filtered by tier,
/// capped at [`PATTERN_CAP`].
pub fn fetch_patterns(store: &Store, kind: Option<PatternKind>) -> motif_core::Result<Vec<Pattern>> {
    let mut patterns: Vec<Pattern> = store
        .scan::<Pattern>(Dataset::Patterns)?
        .filter(|p| kind.is_none_or(|k| p.kind == k))
        .collect();
    patterns.sort_by(|a, b| {
        let score_a = a.frequency as f64 * a.confidence;
        let score_b = b.frequency as f64 * b.confidence;
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    patterns.truncate(PATTERN_CAP);
    Ok(patterns)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
