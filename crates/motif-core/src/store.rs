//! Append-only record logs and sidecar metadata.
//!
//! Each dataset is one JSONL file (UTF-8, LF-terminated, one record per
//! line). Appends are whole-line writes; a crash mid-append leaves at most
//! one malformed trailing line, which scans drop with a warning. There is no
//! cross-log transactionality: re-indexing is "clear snippets, rewrite all,
//! then clear clusters, write all".

use crate::error::{MotifError, Result};
use crate::record::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::warn;

const METADATA_DIR: &str = "metadata";

/// The three record logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Snippets,
    Clusters,
    Patterns,
}

impl Dataset {
    pub fn name(self) -> &'static str {
        match self {
            Self::Snippets => "snippets",
            Self::Clusters => "clusters",
            Self::Patterns => "patterns",
        }
    }
}

/// Handle to one on-disk data directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (creating if needed) a data directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dataset in [Dataset::Snippets, Dataset::Clusters, Dataset::Patterns] {
            fs::create_dir_all(root.join(dataset.name()))
                .map_err(|e| MotifError::io("create dataset directory", e))?;
        }
        fs::create_dir_all(root.join(METADATA_DIR))
            .map_err(|e| MotifError::io("create metadata directory", e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn log_path(&self, dataset: Dataset) -> PathBuf {
        self.root
            .join(dataset.name())
            .join(format!("{}.jsonl", dataset.name()))
    }

    /// Whether a dataset's log has been created (a prior stage has run).
    pub fn exists(&self, dataset: Dataset) -> bool {
        self.log_path(dataset).exists()
    }

    /// Append one record to the tail of a log. The append unit is one
    /// complete line; there is no uniqueness check.
    pub fn append<T: Serialize>(&self, dataset: Dataset, record: &T) -> Result<()> {
        let line = serde_json::to_string(record).map_err(|e| MotifError::Decode {
            dataset: dataset.name().to_string(),
            reason: e.to_string(),
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(dataset))
            .map_err(|e| MotifError::io("open log for append", e))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .map_err(|e| MotifError::io("append record", e))
    }

    /// Lazy scan over a log in insertion order. Malformed lines are skipped
    /// with a warning; scans never abort on them. A missing log yields an
    /// empty scan.
    pub fn scan<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<Scan<T>> {
        let path = self.log_path(dataset);
        let lines = if path.exists() {
            let file = File::open(&path).map_err(|e| MotifError::io("open log for scan", e))?;
            Some(BufReader::new(file).lines())
        } else {
            None
        };
        Ok(Scan {
            lines,
            dataset,
            _marker: PhantomData,
        })
    }

    /// Collect a full log into memory.
    pub fn scan_all<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<Vec<T>> {
        Ok(self.scan(dataset)?.collect())
    }

    /// Linear scan with early exit. Indexing stages stream instead of
    /// point-looking-up, so this stays O(n) without an index.
    pub fn get_by_id<T: Record>(&self, dataset: Dataset, id: &str) -> Result<Option<T>> {
        Ok(self.scan::<T>(dataset)?.find(|record| record.id() == id))
    }

    /// Truncate a log, leaving an empty (but existing) dataset behind.
    pub fn clear(&self, dataset: Dataset) -> Result<()> {
        File::create(self.log_path(dataset))
            .map(|_| ())
            .map_err(|e| MotifError::io("truncate log", e))
    }

    /// Whole-file replace of a metadata blob (`metadata/<key>.json`).
    pub fn write_sidecar<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(|e| MotifError::Decode {
            dataset: key.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(self.sidecar_path(key), json).map_err(|e| MotifError::io("write sidecar", e))
    }

    /// Read a metadata blob, or `None` if it has never been written.
    pub fn read_sidecar<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.sidecar_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| MotifError::io("read sidecar", e))?;
        let value = serde_json::from_str(&content).map_err(|e| MotifError::Decode {
            dataset: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(value))
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.root.join(METADATA_DIR).join(format!("{key}.json"))
    }
}

/// Restartable iterator over decoded records.
pub struct Scan<T> {
    lines: Option<Lines<BufReader<File>>>,
    dataset: Dataset,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Iterator for Scan<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let lines = self.lines.as_mut()?;
        loop {
            match lines.next()? {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str(&line) {
                        Ok(record) => return Some(record),
                        Err(err) => {
                            warn!(
                                dataset = self.dataset.name(),
                                error = %err,
                                "dropping malformed record"
                            );
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        dataset = self.dataset.name(),
                        error = %err,
                        "read failure mid-scan; stopping"
                    );
                    return None;
                }
            }
        }
    }
}
