//! # Movie Loader
//!
//! Loads a movies CSV into an OpenSearch collection and times repeated bulk
//! inserts of the same document set.
//!
//! ## Architecture
//!
//! 1. **Reader**: Reads the CSV into memory as raw lines
//! 2. **Mapper**: Turns each line into a `MovieDocument`
//! 3. **Submitter**: Bulk inserts the documents, once or on a background loop
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`reader`]: CSV reading
//! - [`mapper`]: Record mapping
//! - [`submitter`]: Batch submission and background runs
//! - [`errors`]: Error types for the loader

pub mod config;
pub mod errors;
pub mod mapper;
pub mod reader;
pub mod submitter;

pub use config::{Dependencies, LoaderSettings};
pub use errors::IngestError;
pub use mapper::{MapperConfig, RecordMapper};
pub use submitter::{BatchSubmitter, SubmissionHandle, SubmitterConfig, SubmitterState};

use movie_loader_repository::SearchStoreError;
use thiserror::Error;

/// Errors that can occur during loader initialization or execution.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl LoaderError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<SearchStoreError> for LoaderError {
    fn from(err: SearchStoreError) -> Self {
        Self::IngestError(IngestError::Store(err))
    }
}
