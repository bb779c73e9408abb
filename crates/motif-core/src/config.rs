//! Tuning constants for the mining pipeline.
//!
//! Load order: `<data>/config.toml` → environment variables → defaults.
//! The resolved config is immutable for the lifetime of a run and is
//! persisted next to the datasets as the `config` sidecar.

use crate::error::{MotifError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default seed for the MinHash hash family. Signatures are only comparable
/// within one seed, so re-indexing an existing dataset must reuse it.
pub const DEFAULT_SEED: u64 = 0x6d6f_7469_66;

/// Process-wide tuning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotifConfig {
    /// Number of LSH bands.
    pub bands: usize,
    /// Signature rows per band. Total signature length is `bands * rows_per_band`.
    pub rows_per_band: usize,
    /// Token window for the n-gram tier.
    pub ngram_size: usize,
    /// Jaccard threshold for the de-dup pass.
    pub similarity_threshold: f64,
    /// Jaccard threshold for similarity-graph edges. Looser than the de-dup
    /// threshold; the two are tuned independently.
    pub cluster_threshold: f64,
    /// Smallest connected component emitted as a cluster.
    pub min_cluster_size: usize,
    /// Minimum cross-snippet support for an emitted pattern.
    pub min_frequency: usize,
    /// Seed for drawing the MinHash hash family.
    pub seed: u64,
}

impl Default for MotifConfig {
    fn default() -> Self {
        Self {
            bands: 20,
            rows_per_band: 5,
            ngram_size: 3,
            similarity_threshold: 0.8,
            cluster_threshold: 0.7,
            min_cluster_size: 2,
            min_frequency: 2,
            seed: DEFAULT_SEED,
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl MotifConfig {
    /// Load config from `<data_root>/config.toml`, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(data_root: &Path) -> Result<Self> {
        let config_path = data_root.join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| MotifError::io("read config.toml", e))?;
            toml::from_str(&content).map_err(|e| MotifError::Config(e.to_string()))?
        } else {
            Self::default()
        };

        env_override("MOTIF_BANDS", &mut config.bands);
        env_override("MOTIF_ROWS", &mut config.rows_per_band);
        env_override("MOTIF_NGRAM_SIZE", &mut config.ngram_size);
        env_override(
            "MOTIF_SIMILARITY_THRESHOLD",
            &mut config.similarity_threshold,
        );
        env_override("MOTIF_CLUSTER_THRESHOLD", &mut config.cluster_threshold);
        env_override("MOTIF_MIN_CLUSTER_SIZE", &mut config.min_cluster_size);
        env_override("MOTIF_MIN_FREQUENCY", &mut config.min_frequency);
        env_override("MOTIF_SEED", &mut config.seed);

        config.validate()?;
        Ok(config)
    }

    /// Total MinHash signature length.
    pub fn signature_len(&self) -> usize {
        self.bands * self.rows_per_band
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bands == 0 || self.rows_per_band == 0 {
            return Err(MotifError::Config(format!(
                "bands ({}) and rows_per_band ({}) must both be >= 1",
                self.bands, self.rows_per_band
            )));
        }
        if self.ngram_size == 0 {
            return Err(MotifError::Config("ngram_size must be >= 1".to_string()));
        }
        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("cluster_threshold", self.cluster_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MotifError::Config(format!(
                    "{name} ({value}) must lie in [0, 1]"
                )));
            }
        }
        if self.min_cluster_size == 0 {
            return Err(MotifError::Config(
                "min_cluster_size must be >= 1".to_string(),
            ));
        }
        if self.min_frequency == 0 {
            return Err(MotifError::Config("min_frequency must be >= 1".to_string()));
        }
        Ok(())
    }
}
