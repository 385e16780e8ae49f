//! Error types for loading and submitting movie documents.

use movie_loader_repository::SearchStoreError;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading, mapping or submitting documents.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input file could not be parsed as CSV.
    #[error("Failed to parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A data line could not be mapped into a document.
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// The search store rejected or failed a request.
    #[error("Store error: {0}")]
    Store(#[from] SearchStoreError),

    /// Invalid loader or submitter configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller stopped waiting for a background submission.
    #[error("Timed out after {0:?} waiting for background submission")]
    Timeout(Duration),

    /// The background submission task panicked or was aborted.
    #[error("Submission task error: {0}")]
    Join(String),
}

impl IngestError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a CSV parse error for `path`.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed row error.
    pub fn malformed_row(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a join error.
    pub fn join(msg: impl Into<String>) -> Self {
        Self::Join(msg.into())
    }
}
