//! OpenSearch collection configuration and mappings.
//!
//! A collection is created either from an `index.json` file in a config
//! directory or from the built-in movie mappings below.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::errors::SearchStoreError;
use crate::utils::validate_collection_name;

/// File looked up inside the collection config directory.
pub const INDEX_SETTINGS_FILE: &str = "index.json";

/// Configuration for the movies collection.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// The collection (index) name used for all operations.
    pub name: String,
    /// Directory holding `index.json`. Built-in mappings are used when `None`.
    pub config_dir: Option<PathBuf>,
    /// Number of primary shards for the built-in settings.
    pub shards: u32,
    /// Number of replicas for the built-in settings.
    pub replicas: u32,
}

impl CollectionConfig {
    /// Create a config with one shard and no replicas (replication factor 1).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_dir: None,
            shards: 1,
            replicas: 0,
        }
    }

    /// Read settings and mappings from `<dir>/index.json` when creating the collection.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), SearchStoreError> {
        validate_collection_name(&self.name)
    }

    /// Resolve the body sent with the create-collection request.
    pub fn settings(&self) -> Result<Value, SearchStoreError> {
        match &self.config_dir {
            Some(dir) => load_settings_file(dir),
            None => Ok(default_collection_settings(self.shards, self.replicas)),
        }
    }
}

fn load_settings_file(dir: &Path) -> Result<Value, SearchStoreError> {
    let path = dir.join(INDEX_SETTINGS_FILE);
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        SearchStoreError::config(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let settings: Value = serde_json::from_str(&contents).map_err(|e| {
        SearchStoreError::config(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    if !settings.is_object() {
        return Err(SearchStoreError::config(format!(
            "{} must contain a JSON object",
            path.display()
        )));
    }

    Ok(settings)
}

/// Get the built-in settings and mappings for the movies collection.
///
/// - `name`: full text with a `raw` keyword sub-field for sorting
/// - `directed_by`, `genre`: keyword arrays for faceting
/// - `initial_release_date`: date
/// - `numActors`: integer
pub fn default_collection_settings(shards: u32, replicas: u32) -> Value {
    json!({
        "settings": {
            "number_of_shards": shards,
            "number_of_replicas": replicas
        },
        "mappings": {
            "properties": {
                "name": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "directed_by": {
                    "type": "keyword"
                },
                "genre": {
                    "type": "keyword"
                },
                "initial_release_date": {
                    "type": "date"
                },
                "numActors": {
                    "type": "integer"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_settings_structure() {
        let settings = CollectionConfig::new("movies").settings().unwrap();

        assert_eq!(settings["settings"]["number_of_shards"], 1);
        assert_eq!(settings["settings"]["number_of_replicas"], 0);

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["name"]["type"], "text");
        assert_eq!(properties["name"]["fields"]["raw"]["type"], "keyword");
        assert_eq!(properties["directed_by"]["type"], "keyword");
        assert_eq!(properties["genre"]["type"], "keyword");
        assert_eq!(properties["initial_release_date"]["type"], "date");
        assert_eq!(properties["numActors"]["type"], "integer");
    }

    #[test]
    fn test_settings_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(INDEX_SETTINGS_FILE),
            r#"{"settings": {"number_of_shards": 3}}"#,
        )
        .unwrap();

        let config = CollectionConfig::new("movies").with_config_dir(dir.path());
        let settings = config.settings().unwrap();

        assert_eq!(settings["settings"]["number_of_shards"], 3);
        assert!(settings.get("mappings").is_none());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectionConfig::new("movies").with_config_dir(dir.path());

        assert!(matches!(
            config.settings(),
            Err(SearchStoreError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_file_must_be_object() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDEX_SETTINGS_FILE), "[1, 2, 3]").unwrap();
        let config = CollectionConfig::new("movies").with_config_dir(dir.path());

        assert!(matches!(
            config.settings(),
            Err(SearchStoreError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_uppercase_name() {
        assert!(CollectionConfig::new("Movies").validate().is_err());
        assert!(CollectionConfig::new("movies").validate().is_ok());
    }
}
