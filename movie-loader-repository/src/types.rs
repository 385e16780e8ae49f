//! Request and response types for search store operations.

/// Username/password pair attached to every request sent to the cluster.
#[derive(Clone)]
pub struct StoreCredentials {
    pub username: String,
    pub password: String,
}

impl StoreCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A single document the cluster rejected inside an otherwise accepted bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// Position of the document in the submitted slice.
    pub position: usize,
    /// HTTP status reported for the item.
    pub status: u16,
    /// Error reason reported by the cluster.
    pub reason: String,
}

/// Summary of a bulk insert.
///
/// A bulk request can be accepted while individual documents in it fail, so
/// the summary reports both counts and the per-item failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertSummary {
    /// Total number of documents submitted.
    pub total: usize,
    /// Number of documents the cluster accepted.
    pub succeeded: usize,
    /// Number of documents the cluster rejected.
    pub failed: usize,
    /// Individual failures.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkInsertSummary {
    /// Summary for a bulk request where every document was accepted.
    pub fn all_succeeded(total: usize) -> Self {
        Self {
            total,
            succeeded: total,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = StoreCredentials::new("solr", "SolrRocks");
        let rendered = format!("{:?}", credentials);

        assert!(rendered.contains("solr"));
        assert!(!rendered.contains("SolrRocks"));
    }

    #[test]
    fn test_all_succeeded() {
        let summary = BulkInsertSummary::all_succeeded(3);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
        assert!(!summary.has_failures());
    }
}
