//! Search store provider trait definition.
//!
//! This module defines the abstract interface for the search store the loader
//! writes into, allowing for different backend implementations.

use async_trait::async_trait;
use movie_loader_shared::MovieDocument;
use serde_json::Value;

use crate::errors::SearchStoreError;
use crate::types::BulkInsertSummary;

/// Abstracts the underlying search store (OpenSearch, or a mock in tests).
///
/// A provider is bound to a single named collection at construction time; every
/// operation targets that collection. Credentials are attached by the provider
/// itself, so callers never handle them per request.
///
/// All methods return `Result<T, SearchStoreError>` for consistent error handling across
/// different backend implementations.
#[async_trait]
pub trait SearchStoreProvider: Send + Sync {
    /// Name of the collection this provider writes into.
    fn collection(&self) -> &str;

    /// Check whether the collection exists.
    async fn collection_exists(&self) -> Result<bool, SearchStoreError>;

    /// Create the collection with its configured settings and mappings.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the collection was created
    /// * `Err(SearchStoreError)` - If the collection already exists or creation fails
    async fn create_collection(&self) -> Result<(), SearchStoreError>;

    /// Delete the collection. A collection that does not exist is not an error.
    async fn delete_collection(&self) -> Result<(), SearchStoreError>;

    /// Submit all documents in one bulk request.
    ///
    /// The call returns once the cluster acknowledged or rejected the request.
    /// Documents rejected individually are reported in the summary rather than as an error.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkInsertSummary)` - Aggregate counts and per-item failures
    /// * `Err(SearchStoreError)` - If the request as a whole failed
    async fn bulk_insert_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BulkInsertSummary, SearchStoreError>;

    /// Delete every document matching `query` and return how many were deleted.
    async fn delete_by_query(&self, query: Value) -> Result<u64, SearchStoreError>;

    /// Make previously submitted writes visible to searches.
    async fn commit(&self) -> Result<(), SearchStoreError>;

    /// Release the client. Later operations fail with a connection error.
    async fn close(&self) -> Result<(), SearchStoreError>;

    /// Ensure the collection exists, creating it if necessary.
    async fn ensure_collection_exists(&self) -> Result<(), SearchStoreError> {
        if self.collection_exists().await? {
            return Ok(());
        }
        self.create_collection().await
    }
}
