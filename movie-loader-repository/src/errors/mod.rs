//! Error types for the movie loader repository.
//!
//! This module provides a unified error type for all search store operations.

mod search_store_error;

pub use search_store_error::SearchStoreError;
