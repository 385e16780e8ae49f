//! # Movie Loader Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search store the movie loader writes into. It includes definitions for
//! errors, interfaces, and a concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;
pub mod utils;

pub use errors::SearchStoreError;
pub use interfaces::SearchStoreProvider;
pub use opensearch::{CollectionConfig, OpenSearchProvider};
pub use types::{BulkInsertSummary, BulkItemFailure, StoreCredentials};
pub use utils::validate_collection_name;
