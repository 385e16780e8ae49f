//! Loader settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use movie_loader_repository::StoreCredentials;

use crate::mapper::MapperConfig;
use crate::submitter::{SubmissionMode, SubmitterConfig, DEFAULT_BATCH_SIZE};

const DEFAULT_CSV_PATH: &str = "data/films.csv";
const DEFAULT_OPENSEARCH_HOSTS: &str = "http://localhost:9200";
const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";
const DEFAULT_COLLECTION_NAME: &str = "movies";
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry at a fixed interval until a node answers.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive). Defaults to fail-fast.
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "fail-fast".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            other => {
                warn!(value = %other, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'fail-fast'");
                Self::FailFast
            }
        }
    }
}

fn parse_submission_mode(value: Option<String>) -> SubmissionMode {
    match value
        .unwrap_or_else(|| "full-set".to_string())
        .to_lowercase()
        .as_str()
    {
        "full-set" | "fullset" | "full_set" => SubmissionMode::FullSet,
        "chunked" => SubmissionMode::Chunked,
        other => {
            warn!(value = %other, "Invalid SUBMISSION_MODE, defaulting to 'full-set'");
            SubmissionMode::FullSet
        }
    }
}

fn parse_bool(key: &str, value: Option<String>) -> bool {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => false,
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") | Some("") => false,
        Some(other) => {
            warn!(key = %key, value = %other, "Invalid boolean, defaulting to false");
            false
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = %key, value = %raw, "Invalid number, using default");
            default
        }),
    }
}

fn parse_optional_number<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
    let raw = value.filter(|raw| !raw.trim().is_empty())?;
    match raw.trim().parse() {
        Ok(number) => Some(number),
        Err(_) => {
            warn!(key = %key, value = %raw, "Invalid number, leaving unset");
            None
        }
    }
}

/// Everything the loader binary needs to run.
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub csv_path: PathBuf,
    pub collection_config_dir: Option<PathBuf>,
    pub opensearch_hosts: Vec<String>,
    /// Basic auth credentials; `Debug` masks the password.
    pub credentials: StoreCredentials,
    pub collection_name: String,
    pub docs_to_insert: usize,
    pub submitter: SubmitterConfig,
    pub mapper: MapperConfig,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub recreate_collection: bool,
    pub clear_collection: bool,
    pub async_wait_timeout: Option<Duration>,
}

impl LoaderSettings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MOVIES_CSV_PATH`: Input CSV (default: data/films.csv)
    /// - `COLLECTION_CONFIG_DIR`: Directory holding `index.json` (default: built-in mappings)
    /// - `OPENSEARCH_HOSTS`: Comma-separated seed nodes (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: Basic auth (default: admin/admin)
    /// - `COLLECTION_NAME`: Target collection (default: movies)
    /// - `DOCS_TO_INSERT`: Documents for the timed background loop (default: 0, loop skipped)
    /// - `BATCH_SIZE`: Documents per batch (default: 1000)
    /// - `SUBMISSION_MODE`: "full-set" or "chunked" (default: full-set)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: fail-fast)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `RECREATE_COLLECTION`: Drop and recreate the collection first (default: false)
    /// - `CLEAR_COLLECTION`: Delete all documents before inserting (default: false)
    /// - `ASYNC_WAIT_TIMEOUT_SECS`: Give up waiting for the background loop (default: unset)
    /// - `SKIP_MALFORMED_ROWS`: Skip rows with too few fields (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the raw value of a variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let opensearch_hosts: Vec<String> = lookup("OPENSEARCH_HOSTS")
            .unwrap_or_else(|| DEFAULT_OPENSEARCH_HOSTS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .collect();

        let submitter = SubmitterConfig {
            batch_size: parse_number("BATCH_SIZE", lookup("BATCH_SIZE"), DEFAULT_BATCH_SIZE),
            mode: parse_submission_mode(lookup("SUBMISSION_MODE")),
        };

        let mapper = MapperConfig {
            skip_malformed: lookup("SKIP_MALFORMED_ROWS")
                .map(|v| parse_bool("SKIP_MALFORMED_ROWS", Some(v)))
                .unwrap_or(true),
            ..MapperConfig::default()
        };

        Self {
            csv_path: lookup("MOVIES_CSV_PATH")
                .unwrap_or_else(|| DEFAULT_CSV_PATH.to_string())
                .into(),
            collection_config_dir: lookup("COLLECTION_CONFIG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            opensearch_hosts,
            credentials: StoreCredentials::new(
                lookup("OPENSEARCH_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
                lookup("OPENSEARCH_PASSWORD").unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            ),
            collection_name: lookup("COLLECTION_NAME")
                .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string()),
            docs_to_insert: parse_number("DOCS_TO_INSERT", lookup("DOCS_TO_INSERT"), 0),
            submitter,
            mapper,
            connection_mode: ConnectionMode::parse(lookup("OPENSEARCH_CONNECTION_MODE")),
            retry_interval: Duration::from_secs(parse_number(
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                lookup("OPENSEARCH_RETRY_INTERVAL_SECS"),
                DEFAULT_RETRY_INTERVAL_SECS,
            )),
            recreate_collection: parse_bool("RECREATE_COLLECTION", lookup("RECREATE_COLLECTION")),
            clear_collection: parse_bool("CLEAR_COLLECTION", lookup("CLEAR_COLLECTION")),
            async_wait_timeout: parse_optional_number(
                "ASYNC_WAIT_TIMEOUT_SECS",
                lookup("ASYNC_WAIT_TIMEOUT_SECS"),
            )
            .map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> LoaderSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LoaderSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]);

        assert_eq!(settings.csv_path, PathBuf::from("data/films.csv"));
        assert!(settings.collection_config_dir.is_none());
        assert_eq!(settings.opensearch_hosts, vec!["http://localhost:9200"]);
        assert_eq!(settings.collection_name, "movies");
        assert_eq!(settings.credentials.username, "admin");
        assert_eq!(settings.credentials.password, "admin");
        assert_eq!(settings.docs_to_insert, 0);
        assert_eq!(settings.submitter.batch_size, 1000);
        assert_eq!(settings.submitter.mode, SubmissionMode::FullSet);
        assert!(settings.mapper.skip_malformed);
        assert_eq!(settings.connection_mode, ConnectionMode::FailFast);
        assert_eq!(settings.retry_interval, Duration::from_secs(15));
        assert!(!settings.recreate_collection);
        assert!(!settings.clear_collection);
        assert!(settings.async_wait_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("MOVIES_CSV_PATH", "/tmp/films.csv"),
            ("COLLECTION_CONFIG_DIR", "/etc/movies/conf"),
            ("OPENSEARCH_HOSTS", "http://a:9200, http://b:9200,"),
            ("COLLECTION_NAME", "films"),
            ("OPENSEARCH_USERNAME", "loader"),
            ("OPENSEARCH_PASSWORD", "s3cret"),
            ("DOCS_TO_INSERT", "2500"),
            ("BATCH_SIZE", "500"),
            ("SUBMISSION_MODE", "Chunked"),
            ("OPENSEARCH_CONNECTION_MODE", "retry"),
            ("OPENSEARCH_RETRY_INTERVAL_SECS", "3"),
            ("RECREATE_COLLECTION", "true"),
            ("CLEAR_COLLECTION", "1"),
            ("ASYNC_WAIT_TIMEOUT_SECS", "60"),
            ("SKIP_MALFORMED_ROWS", "false"),
        ]);

        assert_eq!(settings.csv_path, PathBuf::from("/tmp/films.csv"));
        assert_eq!(
            settings.collection_config_dir,
            Some(PathBuf::from("/etc/movies/conf"))
        );
        assert_eq!(
            settings.opensearch_hosts,
            vec!["http://a:9200", "http://b:9200"]
        );
        assert_eq!(settings.collection_name, "films");
        assert_eq!(settings.credentials.username, "loader");
        assert!(!format!("{:?}", settings).contains("s3cret"));
        assert_eq!(settings.docs_to_insert, 2500);
        assert_eq!(settings.submitter.batch_size, 500);
        assert_eq!(settings.submitter.mode, SubmissionMode::Chunked);
        assert_eq!(settings.connection_mode, ConnectionMode::Retry);
        assert_eq!(settings.retry_interval, Duration::from_secs(3));
        assert!(settings.recreate_collection);
        assert!(settings.clear_collection);
        assert_eq!(settings.async_wait_timeout, Some(Duration::from_secs(60)));
        assert!(!settings.mapper.skip_malformed);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let settings = settings_from(&[
            ("DOCS_TO_INSERT", "lots"),
            ("SUBMISSION_MODE", "sideways"),
            ("OPENSEARCH_CONNECTION_MODE", "maybe"),
            ("CLEAR_COLLECTION", "perhaps"),
            ("ASYNC_WAIT_TIMEOUT_SECS", "soon"),
        ]);

        assert_eq!(settings.docs_to_insert, 0);
        assert_eq!(settings.submitter.mode, SubmissionMode::FullSet);
        assert_eq!(settings.connection_mode, ConnectionMode::FailFast);
        assert!(!settings.clear_collection);
        assert!(settings.async_wait_timeout.is_none());
    }

    #[test]
    fn test_parse_optional_number() {
        assert_eq!(parse_optional_number::<u64>("K", Some(" 30 ".to_string())), Some(30));
        assert_eq!(parse_optional_number::<u64>("K", Some("-1".to_string())), None);
        assert_eq!(parse_optional_number::<u64>("K", Some(String::new())), None);
        assert_eq!(parse_optional_number::<u64>("K", None), None);
    }
}
