//! Core types and storage for motif datasets.
//!
//! Provides the record data model ([`record::Snippet`], [`record::Cluster`],
//! [`record::Pattern`]), the tuning configuration, typed error kinds, and the
//! append-only JSONL store that backs every pipeline stage.

pub mod config;
pub mod error;
pub mod record;
pub mod store;

pub use error::{MotifError, Result};
