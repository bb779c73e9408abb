//! End-to-end pipeline tests over the library crates the CLI drives:
//! extract → tokenize → sign → store, then index, then synthesise.

use chrono::Utc;
use motif_core::config::MotifConfig;
use motif_core::record::{self, Cluster, PatternKind, Snippet};
use motif_core::store::{Dataset, Store};
use motif_index::{LshContext, LshIndex, build_clusters, dedup_snippets};
use motif_lang::{Language, Normalizer, SnippetExtractor, tokenize};
use std::path::Path;

/// Ingest one source file the way `motif ingest` does.
fn ingest_file(store: &Store, ctx: &LshContext, path: &Path, source: &str) -> usize {
    let extractor = SnippetExtractor::new();
    let normalizer = Normalizer::new();
    let language = Language::from_path(path);

    let mut appended = 0;
    for fragment in extractor.extract(source, language) {
        let normalized = normalizer.normalize(&fragment.content, language);
        let tokens = tokenize(&normalized);
        if tokens.is_empty() {
            continue;
        }
        let hash = record::content_hash(&fragment.content);
        let snippet = Snippet {
            id: record::snippet_id(
                &path.display().to_string(),
                fragment.line_start,
                fragment.line_end,
                &hash,
            ),
            signature: ctx.signature(&tokens),
            content: fragment.content,
            language: language.name().to_string(),
            file: path.display().to_string(),
            line_start: fragment.line_start,
            line_end: fragment.line_end,
            content_hash: hash,
            tokens,
            cluster_id: None,
            created_at: Utc::now(),
        };
        store.append(Dataset::Snippets, &snippet).unwrap();
        appended += 1;
    }
    appended
}

/// Run the index stage the way `motif index` does (no de-dup).
fn index_store(store: &Store, config: &MotifConfig, ctx: &LshContext) -> Vec<Cluster> {
    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
    let mut index = LshIndex::new(ctx);
    for snippet in &snippets {
        index.insert(snippet.id.clone(), snippet.signature.clone());
    }
    let verified = index.verified_pairs(config.cluster_threshold);
    let clusters = build_clusters(&snippets, &verified, config.min_cluster_size, false);

    store.clear(Dataset::Clusters).unwrap();
    for cluster in &clusters {
        store.append(Dataset::Clusters, cluster).unwrap();
    }
    clusters
}

#[test]
fn test_exact_duplicates_cluster_with_similarity_one() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    let source = "function add(a,b){ return a+b }";
    ingest_file(&store, &ctx, Path::new("one.js"), source);
    ingest_file(&store, &ctx, Path::new("two.js"), source);

    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
    assert_eq!(snippets.len(), 2);
    assert_eq!(
        snippets[0].content_hash, snippets[1].content_hash,
        "identical content must hash identically"
    );

    let clusters = index_store(&store, &config, &ctx);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].size(), 2);
    assert_eq!(clusters[0].similarity, 1.0);
}

#[test]
fn test_renamed_variables_cluster_together() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    ingest_file(
        &store,
        &ctx,
        Path::new("f.js"),
        "function f(x,y){ return x+y }",
    );
    ingest_file(
        &store,
        &ctx,
        Path::new("g.js"),
        "function g(a,b){ return a+b }",
    );

    let clusters = index_store(&store, &config, &ctx);
    assert_eq!(clusters.len(), 1, "renamed clones must co-cluster");
    assert_eq!(clusters[0].size(), 2);
    assert!(clusters[0].similarity >= 0.7);
}

#[test]
fn test_dissimilar_snippets_do_not_cluster() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    ingest_file(
        &store,
        &ctx,
        Path::new("totals.js"),
        "function sumTotals(entries){ let total = 0; for (const entry of entries) { total += entry.amount; } return total }",
    );
    ingest_file(
        &store,
        &ctx,
        Path::new("greeting.js"),
        "function greetVisitor(visitor){ const message = \"hello\"; console.log(message, visitor.nickname); return message }",
    );

    let clusters = index_store(&store, &config, &ctx);
    assert!(clusters.is_empty(), "unrelated snippets must not co-cluster");
}

#[test]
fn test_dedup_pass_keeps_one_of_identical_pair() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    let source = "function add(a,b){ return a+b }";
    ingest_file(&store, &ctx, Path::new("one.js"), source);
    ingest_file(&store, &ctx, Path::new("two.js"), source);

    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
    let outcome = dedup_snippets(snippets, &ctx, config.similarity_threshold);
    assert_eq!(outcome.kept.len(), 1);
    assert_eq!(outcome.dropped_exact, 1);
}

#[test]
fn test_stored_snippets_satisfy_signature_invariant() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    ingest_file(
        &store,
        &ctx,
        Path::new("app.py"),
        "def load_settings(path):\n    with open(path) as handle:\n        return handle.read()\n",
    );

    for snippet in store.scan::<Snippet>(Dataset::Snippets).unwrap() {
        assert_eq!(snippet.signature.len(), config.signature_len());
        assert!(snippet.line_end >= snippet.line_start);
        assert!(snippet.line_start >= 1);
        assert!(!snippet.tokens.is_empty());
    }
}

#[test]
fn test_cluster_invariants_after_full_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    // Two near-identical JS snippets; string literals are blanked during
    // normalisation, so only the raw content differs.
    ingest_file(
        &store,
        &ctx,
        Path::new("a.js"),
        "function parseHeader(line){ const parts = line.split(\":\"); return parts }",
    );
    ingest_file(
        &store,
        &ctx,
        Path::new("b.js"),
        "function parseHeader(line){ const parts = line.split(\";\"); return parts }",
    );

    let clusters = index_store(&store, &config, &ctx);
    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();

    for cluster in &clusters {
        assert!(cluster.snippet_ids.contains(&cluster.centroid_id));
        assert!(cluster.size() >= config.min_cluster_size);

        let member_languages: std::collections::BTreeSet<String> = snippets
            .iter()
            .filter(|s| cluster.snippet_ids.contains(&s.id))
            .map(|s| s.language.clone())
            .collect();
        assert_eq!(member_languages, cluster.languages);
    }
}

#[test]
fn test_synthesis_emits_ranked_patterns_and_is_repeatable() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    let shared_body = "function checkValue(input){ if (input.size > limit) { return null; } return input }";
    ingest_file(&store, &ctx, Path::new("a.js"), shared_body);
    ingest_file(&store, &ctx, Path::new("b.js"), shared_body);
    ingest_file(
        &store,
        &ctx,
        Path::new("c.js"),
        "function logEvent(event){ if (event.level > threshold) { emit(event); } }",
    );

    index_store(&store, &config, &ctx);
    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
    let clusters: Vec<Cluster> = store.scan_all(Dataset::Clusters).unwrap();

    let patterns = motif_synth::mine(&snippets, &clusters, &config, None);
    assert!(!patterns.is_empty());

    // Ranked by descending frequency.
    for window in patterns.windows(2) {
        assert!(window[0].frequency >= window[1].frequency);
    }

    // The ngram/ast frequency invariant holds for everything emitted.
    for pattern in &patterns {
        match pattern.kind {
            PatternKind::Ngram | PatternKind::Ast => {
                assert_eq!(pattern.frequency, pattern.snippet_ids.len());
            }
            PatternKind::Lcs => assert!(pattern.frequency >= 2),
        }
        assert!((0.0..=1.0).contains(&pattern.confidence));
    }

    // Structural tier sees the shared JS shapes across all three snippets.
    assert!(
        patterns
            .iter()
            .any(|p| p.kind == PatternKind::Ast && p.content == "function ID(CONDITION)")
    );

    // Re-running synthesis over the unchanged datasets reproduces the set.
    let again = motif_synth::mine(&snippets, &clusters, &config, None);
    let contents: Vec<&str> = patterns.iter().map(|p| p.content.as_str()).collect();
    let contents_again: Vec<&str> = again.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, contents_again);
}

#[test]
fn test_reindex_attaches_cluster_ids_on_rewrite() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let config = MotifConfig::default();
    let ctx = LshContext::from_config(&config);

    let source = "function add(a,b){ return a+b }";
    ingest_file(&store, &ctx, Path::new("one.js"), source);
    ingest_file(&store, &ctx, Path::new("two.js"), source);

    let clusters = index_store(&store, &config, &ctx);
    let assigned = &clusters[0];

    // Mirror the CLI's rewrite: snippets gain their cluster id.
    let mut snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
    for snippet in &mut snippets {
        if assigned.snippet_ids.contains(&snippet.id) {
            snippet.cluster_id = Some(assigned.id.clone());
        }
    }
    store.clear(Dataset::Snippets).unwrap();
    for snippet in &snippets {
        store.append(Dataset::Snippets, snippet).unwrap();
    }

    let reloaded: Vec<Snippet> = store.scan_all(Dataset::Snippets).unwrap();
    assert!(
        reloaded
            .iter()
            .all(|s| s.cluster_id.as_deref() == Some(assigned.id.as_str()))
    );
}
