//! OpenSearch implementation of the search store provider.

mod collection_config;
mod provider;

pub use collection_config::{default_collection_settings, CollectionConfig, INDEX_SETTINGS_FILE};
pub use provider::{summarize_bulk_response, OpenSearchProvider};
