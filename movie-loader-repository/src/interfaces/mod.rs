//! Interface definitions for the search store provider.
//!
//! This module defines the abstract `SearchStoreProvider` trait so the loader
//! can be wired against OpenSearch in production and a mock in tests.

mod search_store_provider;

pub use search_store_provider::SearchStoreProvider;
