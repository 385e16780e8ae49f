//! Search store error types.
//!
//! This module defines the unified error type for all search store operations,
//! covering both transport failures and rejected requests.

use thiserror::Error;

/// Unified errors from search store operations.
///
/// Used by the `SearchStoreProvider` trait for every operation, so callers can
/// tell a connection problem apart from a rejected bulk request or a broken
/// collection configuration.
#[derive(Debug, Clone, Error)]
pub enum SearchStoreError {
    /// Validation error (e.g., invalid collection name).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to reach the cluster, or the provider was already closed.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The bulk insert request failed as a whole.
    #[error("Bulk insert error: {0}")]
    BulkInsertError(String),

    /// Delete-by-query failed.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Failed to create the collection.
    #[error("Collection creation error: {0}")]
    CollectionCreationError(String),

    /// Failed to delete the collection.
    #[error("Collection deletion error: {0}")]
    CollectionDeletionError(String),

    /// Failed to refresh the collection after a write.
    #[error("Commit error: {0}")]
    CommitError(String),

    /// Failed to parse a response from the cluster.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize a document.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The collection configuration directory could not be read.
    #[error("Collection config error: {0}")]
    ConfigError(String),
}

impl SearchStoreError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk insert error.
    pub fn bulk_insert(msg: impl Into<String>) -> Self {
        Self::BulkInsertError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create a collection creation error.
    pub fn collection_creation(msg: impl Into<String>) -> Self {
        Self::CollectionCreationError(msg.into())
    }

    /// Create a collection deletion error.
    pub fn collection_deletion(msg: impl Into<String>) -> Self {
        Self::CollectionDeletionError(msg.into())
    }

    /// Create a commit error.
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::CommitError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a collection config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
