//! Error types for index building, fetching and cache persistence.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FastaError>;

/// Failures surfaced by the index builder and the subsequence fetcher.
#[derive(Error, Debug)]
pub enum FastaError {
    /// Malformed record structure.
    #[error("Malformed FASTA{}: {msg}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Format { line: Option<u64>, msg: String },

    #[error("Duplicate sequence name '{0}'")]
    DuplicateName(String),

    #[error("Sequence '{0}' not found in index")]
    NotFound(String),

    #[error("Invalid range {start}-{stop} for sequence '{name}' of length {length}")]
    Range {
        name: String,
        start: u64,
        stop: u64,
        length: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FastaError {
    pub(crate) fn format_at(line: u64, msg: impl Into<String>) -> Self {
        FastaError::Format {
            line: Some(line),
            msg: msg.into(),
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        FastaError::Format {
            line: None,
            msg: msg.into(),
        }
    }
}

/// Failures of the sidecar cache. These never reach callers of
/// [`crate::store::FastaStore`]; they are logged and answered with a rebuild.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cache {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cache {path} is stale (stored mtime {stored}, file mtime {current})")]
    Stale {
        path: PathBuf,
        stored: f64,
        current: f64,
    },

    #[error("Cache {path} holds an inconsistent index: {source}")]
    Index {
        path: PathBuf,
        source: FastaError,
    },
}
