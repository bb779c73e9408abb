//! CLI binary for motif: ingest source corpora, cluster near-duplicate
//! snippets, and mine recurring patterns.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use motif_core::MotifError;
use motif_core::config::MotifConfig;
use motif_core::record::{self, IndexStats, PatternKind, Snippet, SynthesisStats};
use motif_core::store::{Dataset, Store};
use motif_index::{LshContext, LshIndex, build_clusters, dedup_snippets};
use motif_lang::{Language, Normalizer, SnippetExtractor, tokenize};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Extension filter applied when `--extensions` is not given.
const DEFAULT_EXTENSIONS: &[&str] = &[
    "js", "ts", "py", "java", "cpp", "c", "go", "rs", "rb", "php",
];

/// Directories pruned from the walk.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "__pycache__",
    ".vscode",
];

#[derive(Parser)]
#[command(name = "motif", about = "Structural-redundancy miner for source corpora")]
struct Cli {
    /// Data directory holding the datasets
    #[arg(short, long, global = true, default_value = "data")]
    data: PathBuf,

    /// Dump per-category skip counters after each stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk source trees and extract tokenised snippets
    Ingest {
        /// Files or directories to ingest
        paths: Vec<PathBuf>,

        /// Recurse into directories
        #[arg(short, long)]
        recursive: bool,

        /// Comma-separated extension filter (default: js,ts,py,java,cpp,c,go,rs,rb,php)
        #[arg(long, value_delimiter = ',')]
        extensions: Vec<String>,
    },

    /// Cluster snippets by MinHash/LSH similarity
    Index {
        /// Override the number of LSH bands
        #[arg(long)]
        bands: Option<usize>,

        /// Override the signature rows per band
        #[arg(long)]
        rows: Option<usize>,

        /// Drop exact and near duplicates before clustering
        #[arg(long)]
        dedup: bool,

        /// Emit size-1 clusters instead of dropping them
        #[arg(long)]
        keep_singletons: bool,
    },

    /// Mine patterns from snippets and clusters
    Synth {
        /// Restrict to one tier: ngram, lcs, or ast
        #[arg(long = "type")]
        tier: Option<String>,

        /// Override the minimum cross-snippet support
        #[arg(long)]
        min_frequency: Option<usize>,
    },

    /// Serve the datasets over HTTP (read-only)
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        let code = err
            .downcast_ref::<MotifError>()
            .map_or(2, MotifError::exit_code);
        eprintln!("motif: {err:#}");
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest {
            paths,
            recursive,
            extensions,
        } => cmd_ingest(&cli.data, cli.verbose, &paths, recursive, &extensions).context("ingest"),
        Commands::Index {
            bands,
            rows,
            dedup,
            keep_singletons,
        } => cmd_index(&cli.data, cli.verbose, bands, rows, dedup, keep_singletons)
            .context("index"),
        Commands::Synth {
            tier,
            min_frequency,
        } => cmd_synth(&cli.data, cli.verbose, tier.as_deref(), min_frequency).context("synth"),
        Commands::Serve { port, host } => cmd_serve(&cli.data, &host, port).context("serve"),
    }
}

#[derive(Default)]
struct IngestCounters {
    files: usize,
    unreadable: usize,
    unknown_language: usize,
    empty_tokens: usize,
}

/// Pre-signature snippet material staged for the parallel hashing pass.
struct Staged {
    content: String,
    language: &'static str,
    file: String,
    line_start: usize,
    line_end: usize,
    tokens: Vec<String>,
}

fn cmd_ingest(
    data: &Path,
    verbose: bool,
    paths: &[PathBuf],
    recursive: bool,
    extensions: &[String],
) -> Result<()> {
    if paths.is_empty() {
        return Err(MotifError::Config("no input paths given".to_string()).into());
    }

    let config = MotifConfig::load(data)?;
    let store = Store::open(data)?;
    let ctx = LshContext::from_config(&config);

    let allowed: Vec<String> = if extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
    } else {
        extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    };

    let files = collect_files(paths, recursive, &allowed)?;
    let extractor = SnippetExtractor::new();
    let normalizer = Normalizer::new();

    let mut counters = IngestCounters::default();
    let mut staged: Vec<Staged> = Vec::new();
    let progress = ProgressBar::new(files.len() as u64);

    for path in &files {
        progress.inc(1);
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable file");
                counters.unreadable += 1;
                continue;
            }
        };
        let language = Language::from_path(path);
        if !language.is_known() {
            counters.unknown_language += 1;
            continue;
        }

        for fragment in extractor.extract(&source, language) {
            let normalized = normalizer.normalize(&fragment.content, language);
            let tokens = tokenize(&normalized);
            if tokens.is_empty() {
                counters.empty_tokens += 1;
                continue;
            }
            staged.push(Staged {
                content: fragment.content,
                language: language.name(),
                file: path.display().to_string(),
                line_start: fragment.line_start,
                line_end: fragment.line_end,
                tokens,
            });
        }
        counters.files += 1;
    }
    progress.finish_and_clear();

    // Signature generation is embarrassingly parallel over snippets; the
    // append log is written serially afterwards.
    let now = Utc::now();
    let snippets: Vec<Snippet> = staged
        .into_par_iter()
        .map(|staged| {
            let hash = record::content_hash(&staged.content);
            Snippet {
                id: record::snippet_id(&staged.file, staged.line_start, staged.line_end, &hash),
                signature: ctx.signature(&staged.tokens),
                content: staged.content,
                language: staged.language.to_string(),
                file: staged.file,
                line_start: staged.line_start,
                line_end: staged.line_end,
                content_hash: hash,
                tokens: staged.tokens,
                cluster_id: None,
                created_at: now,
            }
        })
        .collect();

    for snippet in &snippets {
        store.append(Dataset::Snippets, snippet)?;
    }
    store.write_sidecar("config", &config)?;

    eprintln!(
        "ingest: {} file(s) → {} snippet(s)",
        counters.files,
        snippets.len()
    );
    if verbose {
        eprintln!("  unreadable files:   {}", counters.unreadable);
        eprintln!("  unknown extension:  {}", counters.unknown_language);
        eprintln!("  empty token lists:  {}", counters.empty_tokens);
    }
    Ok(())
}

/// Deterministic pre-order walk over the input paths. Explicit input paths
/// that do not exist are fatal; unreadable entries below them are logged
/// and skipped.
fn collect_files(paths: &[PathBuf], recursive: bool, allowed: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            if has_allowed_extension(path, allowed) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            let max_depth = if recursive { usize::MAX } else { 1 };
            let walker = WalkDir::new(path)
                .max_depth(max_depth)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    // Prune skip-list directories, but never the walk root
                    // itself (the user may name an input dir "build").
                    entry.depth() == 0
                        || !(entry.file_type().is_dir()
                            && entry
                                .file_name()
                                .to_str()
                                .is_some_and(|name| SKIP_DIRS.contains(&name)))
                });
            for entry in walker {
                match entry {
                    Ok(entry) => {
                        if entry.file_type().is_file()
                            && has_allowed_extension(entry.path(), allowed)
                        {
                            files.push(entry.into_path());
                        }
                    }
                    Err(err) => warn!(error = %err, "skipping unwalkable entry"),
                }
            }
        } else {
            return Err(MotifError::io(
                "read input path",
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                ),
            )
            .into());
        }
    }
    Ok(files)
}

fn has_allowed_extension(path: &Path, allowed: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| *a == ext)
        })
}

fn cmd_index(
    data: &Path,
    verbose: bool,
    bands: Option<usize>,
    rows: Option<usize>,
    dedup: bool,
    keep_singletons: bool,
) -> Result<()> {
    let mut config = MotifConfig::load(data)?;
    if let Some(bands) = bands {
        config.bands = bands;
    }
    if let Some(rows) = rows {
        config.rows_per_band = rows;
    }
    config.validate()?;

    let store = Store::open(data)?;
    let mut snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets)?;
    if snippets.is_empty() {
        return Err(MotifError::EmptyDataset {
            dataset: "snippets".to_string(),
            needed: "ingest".to_string(),
        }
        .into());
    }

    let ctx = LshContext::from_config(&config);

    // Banding overrides change the signature length; re-derive stale
    // signatures from the stored token sequences.
    let expected = ctx.signature_len();
    let stale = snippets
        .iter()
        .filter(|s| s.signature.len() != expected)
        .count();
    if stale > 0 {
        warn!(stale, expected, "recomputing signatures for new banding");
        snippets
            .par_iter_mut()
            .filter(|s| s.signature.len() != expected)
            .for_each(|s| s.signature = ctx.signature(&s.tokens));
    }

    let mut stats = IndexStats {
        snippets_scanned: snippets.len(),
        ..Default::default()
    };

    let working = if dedup {
        let outcome = dedup_snippets(snippets, &ctx, config.similarity_threshold);
        stats.exact_duplicates_dropped = outcome.dropped_exact;
        stats.near_duplicates_dropped = outcome.dropped_near;
        outcome.kept
    } else {
        snippets
    };

    let mut index = LshIndex::new(&ctx);
    for snippet in &working {
        index.insert(snippet.id.clone(), snippet.signature.clone());
    }
    let candidates = index.candidate_pairs();
    let verified = index.verify(&candidates, config.cluster_threshold);
    stats.candidate_pairs = candidates.len();
    stats.verified_pairs = verified.len();

    let clusters = build_clusters(&working, &verified, config.min_cluster_size, keep_singletons);

    let assignment: HashMap<&str, &str> = clusters
        .iter()
        .flat_map(|cluster| {
            cluster
                .snippet_ids
                .iter()
                .map(|id| (id.as_str(), cluster.id.as_str()))
        })
        .collect();

    let mut working = working;
    for snippet in &mut working {
        snippet.cluster_id = assignment
            .get(snippet.id.as_str())
            .map(|id| (*id).to_string());
    }

    // Re-indexing is "clear snippets, rewrite all, then clear clusters,
    // write all"; there is no cross-log transaction.
    store.clear(Dataset::Snippets)?;
    for snippet in &working {
        store.append(Dataset::Snippets, snippet)?;
    }
    store.clear(Dataset::Clusters)?;
    for cluster in &clusters {
        store.append(Dataset::Clusters, cluster)?;
    }

    stats.clusters_emitted = clusters.len();
    stats.clustered_snippets = assignment.len();
    stats.finished_at = Some(Utc::now());
    store.write_sidecar("indexStats", &stats)?;
    store.write_sidecar("config", &config)?;

    eprintln!(
        "index: {} snippet(s) → {} cluster(s)",
        working.len(),
        clusters.len()
    );
    if verbose {
        eprintln!("  exact duplicates dropped: {}", stats.exact_duplicates_dropped);
        eprintln!("  near duplicates dropped:  {}", stats.near_duplicates_dropped);
        eprintln!("  candidate pairs:          {}", stats.candidate_pairs);
        eprintln!("  verified pairs:           {}", stats.verified_pairs);
    }
    Ok(())
}

fn cmd_synth(
    data: &Path,
    verbose: bool,
    tier: Option<&str>,
    min_frequency: Option<usize>,
) -> Result<()> {
    let mut config = MotifConfig::load(data)?;
    if let Some(min_frequency) = min_frequency {
        config.min_frequency = min_frequency;
    }
    config.validate()?;

    let kind = match tier {
        None => None,
        Some(name) => Some(PatternKind::from_name(name).ok_or_else(|| {
            MotifError::Config(format!(
                "unknown pattern type '{name}' (expected ngram, lcs, or ast)"
            ))
        })?),
    };

    let store = Store::open(data)?;
    let snippets: Vec<Snippet> = store.scan_all(Dataset::Snippets)?;
    if snippets.is_empty() {
        return Err(MotifError::EmptyDataset {
            dataset: "snippets".to_string(),
            needed: "ingest".to_string(),
        }
        .into());
    }
    if !store.exists(Dataset::Clusters) {
        return Err(MotifError::EmptyDataset {
            dataset: "clusters".to_string(),
            needed: "index".to_string(),
        }
        .into());
    }
    let clusters = store.scan_all(Dataset::Clusters)?;

    let patterns = motif_synth::mine(&snippets, &clusters, &config, kind);

    store.clear(Dataset::Patterns)?;
    for pattern in &patterns {
        store.append(Dataset::Patterns, pattern)?;
    }

    let count_kind = |kind: PatternKind| patterns.iter().filter(|p| p.kind == kind).count();
    let stats = SynthesisStats {
        snippets: snippets.len(),
        clusters: clusters.len(),
        ngram_patterns: count_kind(PatternKind::Ngram),
        lcs_patterns: count_kind(PatternKind::Lcs),
        ast_patterns: count_kind(PatternKind::Ast),
        total_emitted: patterns.len(),
        finished_at: Some(Utc::now()),
    };
    store.write_sidecar("synthesisStats", &stats)?;

    eprintln!(
        "synth: {} pattern(s) from {} snippet(s) in {} cluster(s)",
        patterns.len(),
        snippets.len(),
        clusters.len()
    );
    if verbose {
        eprintln!("  ngram: {}", stats.ngram_patterns);
        eprintln!("  lcs:   {}", stats.lcs_patterns);
        eprintln!("  ast:   {}", stats.ast_patterns);
    }
    Ok(())
}

fn cmd_serve(data: &Path, host: &str, port: u16) -> Result<()> {
    let store = Store::open(data)?;
    let runtime = tokio::runtime::Runtime::new().context("start async runtime")?;
    runtime.block_on(motif_server::serve(store, host, port))
}
