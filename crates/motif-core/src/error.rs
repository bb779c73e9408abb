//! Error kinds shared across the pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MotifError>;

/// Failure categories surfaced by the pipeline stages.
///
/// `EmptyDataset` maps to exit code 1 (a prerequisite stage has not run);
/// everything else maps to exit code 2.
#[derive(Debug, Error)]
pub enum MotifError {
    #[error("{stage}: {source}")]
    Io {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {dataset}: {reason}")]
    Decode { dataset: String, reason: String },

    #[error("dataset '{dataset}' is empty; run `motif {needed}` first")]
    EmptyDataset { dataset: String, needed: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MotifError {
    /// Wrap an I/O error with the stage it occurred in.
    pub fn io(stage: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            stage: stage.into(),
            source,
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EmptyDataset { .. } => 1,
            Self::Io { .. } | Self::Decode { .. } | Self::Config(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = MotifError::EmptyDataset {
            dataset: "snippets".to_string(),
            needed: "ingest".to_string(),
        };
        assert_eq!(missing.exit_code(), 1);

        let io = MotifError::io("append", std::io::Error::other("disk full"));
        assert_eq!(io.exit_code(), 2);

        let config = MotifError::Config("bands must be >= 1".to_string());
        assert_eq!(config.exit_code(), 2);
    }

    #[test]
    fn test_empty_dataset_message_names_prerequisite() {
        let err = MotifError::EmptyDataset {
            dataset: "clusters".to_string(),
            needed: "index".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("clusters"));
        assert!(msg.contains("index"));
    }
}
