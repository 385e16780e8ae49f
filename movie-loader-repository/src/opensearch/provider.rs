//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchStoreProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use movie_loader_shared::MovieDocument;
use opensearch::{
    auth::Credentials,
    http::{
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesRefreshParts},
    BulkParts, DeleteByQueryParts, OpenSearch,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchStoreError;
use crate::interfaces::SearchStoreProvider;
use crate::opensearch::collection_config::CollectionConfig;
use crate::types::{BulkInsertSummary, BulkItemFailure, StoreCredentials};

/// OpenSearch provider implementation.
///
/// Connects to the first reachable node of a seed list and writes into a single
/// collection. Basic auth credentials are configured on the transport, so they
/// accompany every request.
///
/// # Example
///
/// ```ignore
/// use movie_loader_repository::{CollectionConfig, OpenSearchProvider, StoreCredentials};
///
/// let provider = OpenSearchProvider::connect(
///     &["http://localhost:9200".to_string()],
///     StoreCredentials::new("admin", "admin"),
///     CollectionConfig::new("movies"),
/// )
/// .await?;
/// provider.ensure_collection_exists().await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    collection: CollectionConfig,
    node_url: Url,
    closed: AtomicBool,
}

impl OpenSearchProvider {
    /// Connect to the cluster through the first seed node that answers a ping.
    ///
    /// # Arguments
    ///
    /// * `hosts` - Seed node URLs, tried in order (e.g., "http://localhost:9200")
    /// * `credentials` - Basic auth credentials attached to every request
    /// * `collection` - The collection this provider writes into
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A provider bound to a live node
    /// * `Err(SearchStoreError)` - If the config is invalid or no node is reachable
    pub async fn connect(
        hosts: &[String],
        credentials: StoreCredentials,
        collection: CollectionConfig,
    ) -> Result<Self, SearchStoreError> {
        collection.validate()?;

        if hosts.is_empty() {
            return Err(SearchStoreError::validation(
                "At least one cluster host must be provided",
            ));
        }

        let mut last_error = None;
        for host in hosts {
            match Self::connect_node(host, &credentials).await {
                Ok((client, node_url)) => {
                    info!(
                        node = %node_url,
                        collection = %collection.name,
                        username = %credentials.username,
                        "Connected to OpenSearch"
                    );
                    return Ok(Self {
                        client,
                        collection,
                        node_url,
                        closed: AtomicBool::new(false),
                    });
                }
                Err(e) => {
                    warn!(host = %host, error = %e, "OpenSearch node unreachable");
                    last_error = Some(e);
                }
            }
        }

        Err(SearchStoreError::connection(format!(
            "No reachable OpenSearch node among {} host(s): {}",
            hosts.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn connect_node(
        host: &str,
        credentials: &StoreCredentials,
    ) -> Result<(OpenSearch, Url), SearchStoreError> {
        let (client, node_url) = Self::build_client(host, credentials)?;

        let response = client
            .ping()
            .send()
            .await
            .map_err(|e| SearchStoreError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchStoreError::connection(format!(
                "Ping to {} failed with status {}",
                node_url, status
            )));
        }

        Ok((client, node_url))
    }

    /// Build a client for a single node without contacting it.
    fn build_client(
        host: &str,
        credentials: &StoreCredentials,
    ) -> Result<(OpenSearch, Url), SearchStoreError> {
        let node_url = Url::parse(host).map_err(|e| SearchStoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(node_url.clone());
        let transport = TransportBuilder::new(conn_pool)
            .auth(Credentials::Basic(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .disable_proxy()
            .build()
            .map_err(|e| SearchStoreError::connection(e.to_string()))?;

        Ok((OpenSearch::new(transport), node_url))
    }

    #[cfg(test)]
    fn unconnected(host: &str, collection: CollectionConfig) -> Result<Self, SearchStoreError> {
        let (client, node_url) =
            Self::build_client(host, &StoreCredentials::new("admin", "admin"))?;
        Ok(Self {
            client,
            collection,
            node_url,
            closed: AtomicBool::new(false),
        })
    }

    /// The node this provider is bound to.
    pub fn node_url(&self) -> &Url {
        &self.node_url
    }

    fn ensure_open(&self) -> Result<(), SearchStoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SearchStoreError::connection("OpenSearch client is closed"));
        }
        Ok(())
    }

    /// Build the newline-delimited bulk body: an action line followed by the document.
    fn bulk_body(documents: &[MovieDocument]) -> Result<Vec<JsonBody<Value>>, SearchStoreError> {
        let mut body = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            let source = serde_json::to_value(document)
                .map_err(|e| SearchStoreError::serialization(e.to_string()))?;
            body.push(JsonBody::new(json!({ "index": {} })));
            body.push(JsonBody::new(source));
        }
        Ok(body)
    }
}

/// Turn a `_bulk` response body into a summary of accepted and rejected documents.
///
/// Items are matched to documents by position. An item counts as failed when it
/// carries an `error` object or a status of 300 or above.
pub fn summarize_bulk_response(
    total: usize,
    body: &Value,
) -> Result<BulkInsertSummary, SearchStoreError> {
    let items = body["items"]
        .as_array()
        .ok_or_else(|| SearchStoreError::parse("Bulk response has no items array"))?;

    if items.len() != total {
        return Err(SearchStoreError::parse(format!(
            "Bulk response has {} items for {} documents",
            items.len(),
            total
        )));
    }

    let mut failures = Vec::new();
    for (position, item) in items.iter().enumerate() {
        // Each item is keyed by its action name, e.g. {"index": {...}}.
        let result = item
            .as_object()
            .and_then(|o| o.values().next())
            .ok_or_else(|| SearchStoreError::parse("Malformed bulk response item"))?;

        let status = result["status"]
            .as_u64()
            .and_then(|status| u16::try_from(status).ok())
            .unwrap_or(0);
        let error = result.get("error").filter(|e| !e.is_null());

        if error.is_some() || status >= 300 {
            let reason = error
                .map(|e| {
                    e["reason"]
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .unwrap_or_else(|| format!("status {}", status));
            failures.push(BulkItemFailure {
                position,
                status,
                reason,
            });
        }
    }

    Ok(BulkInsertSummary {
        total,
        succeeded: total - failures.len(),
        failed: failures.len(),
        failures,
    })
}

#[async_trait]
impl SearchStoreProvider for OpenSearchProvider {
    fn collection(&self) -> &str {
        &self.collection.name
    }

    async fn collection_exists(&self) -> Result<bool, SearchStoreError> {
        self.ensure_open()?;

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.collection.name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchStoreError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchStoreError::parse(format!(
                "Unexpected status {} checking collection '{}'",
                status, self.collection.name
            ))),
        }
    }

    async fn create_collection(&self) -> Result<(), SearchStoreError> {
        self.ensure_open()?;

        let settings = self.collection.settings()?;

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.collection.name))
            .body(settings)
            .send()
            .await
            .map_err(|e| SearchStoreError::collection_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Create collection request failed");
            return Err(SearchStoreError::collection_creation(format!(
                "Create collection '{}' failed with status {}: {}",
                self.collection.name, status, error_body
            )));
        }

        info!(
            collection = %self.collection.name,
            config_dir = ?self.collection.config_dir,
            "Collection created"
        );
        Ok(())
    }

    async fn delete_collection(&self) -> Result<(), SearchStoreError> {
        self.ensure_open()?;

        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[self.collection.name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchStoreError::collection_deletion(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - the collection may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete collection request failed");
            return Err(SearchStoreError::collection_deletion(format!(
                "Delete collection '{}' failed with status {}: {}",
                self.collection.name, status, error_body
            )));
        }

        info!(collection = %self.collection.name, "Collection deleted");
        Ok(())
    }

    async fn bulk_insert_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BulkInsertSummary, SearchStoreError> {
        self.ensure_open()?;

        if documents.is_empty() {
            return Ok(BulkInsertSummary::default());
        }

        let body = Self::bulk_body(documents)?;

        let response = self
            .client
            .bulk(BulkParts::Index(&self.collection.name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchStoreError::bulk_insert(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk insert request failed");
            return Err(SearchStoreError::bulk_insert(format!(
                "Bulk insert failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchStoreError::parse(e.to_string()))?;

        let summary = summarize_bulk_response(documents.len(), &response_body)?;

        debug!(
            collection = %self.collection.name,
            total = summary.total,
            failed = summary.failed,
            "Bulk insert acknowledged"
        );
        Ok(summary)
    }

    async fn delete_by_query(&self, query: Value) -> Result<u64, SearchStoreError> {
        self.ensure_open()?;

        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[self.collection.name.as_str()]))
            .body(json!({ "query": query }))
            .send()
            .await
            .map_err(|e| SearchStoreError::delete(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete by query request failed");
            return Err(SearchStoreError::delete(format!(
                "Delete by query failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchStoreError::parse(e.to_string()))?;

        let deleted = response_body["deleted"].as_u64().unwrap_or(0);
        debug!(collection = %self.collection.name, deleted, "Deleted documents by query");
        Ok(deleted)
    }

    async fn commit(&self) -> Result<(), SearchStoreError> {
        self.ensure_open()?;

        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[self.collection.name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchStoreError::commit(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Refresh request failed");
            return Err(SearchStoreError::commit(format!(
                "Refresh failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(collection = %self.collection.name, "Collection refreshed");
        Ok(())
    }

    async fn close(&self) -> Result<(), SearchStoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(SearchStoreError::connection(
                "OpenSearch client is already closed",
            ));
        }
        info!(node = %self.node_url, "OpenSearch client closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_all_succeeded() {
        let body = json!({
            "took": 3,
            "errors": false,
            "items": [
                { "index": { "_id": "a", "status": 201 } },
                { "index": { "_id": "b", "status": 201 } }
            ]
        });

        let summary = summarize_bulk_response(2, &body).unwrap();

        assert_eq!(summary, BulkInsertSummary::all_succeeded(2));
    }

    #[test]
    fn test_summarize_partial_failure() {
        let body = json!({
            "errors": true,
            "items": [
                { "index": { "status": 201 } },
                { "index": {
                    "status": 400,
                    "error": {
                        "type": "mapper_parsing_exception",
                        "reason": "failed to parse field [initial_release_date]"
                    }
                } },
                { "index": { "status": 201 } }
            ]
        });

        let summary = summarize_bulk_response(3, &body).unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            summary.failures,
            vec![BulkItemFailure {
                position: 1,
                status: 400,
                reason: "failed to parse field [initial_release_date]".to_string(),
            }]
        );
    }

    #[test]
    fn test_summarize_error_without_reason() {
        let body = json!({
            "items": [ { "index": { "status": 429, "error": { "type": "es_rejected_execution_exception" } } } ]
        });

        let summary = summarize_bulk_response(1, &body).unwrap();

        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].reason.contains("es_rejected_execution_exception"));
    }

    #[test]
    fn test_summarize_missing_items() {
        let result = summarize_bulk_response(1, &json!({ "errors": false }));
        assert!(matches!(result, Err(SearchStoreError::ParseError(_))));
    }

    #[test]
    fn test_summarize_item_count_mismatch() {
        let body = json!({ "items": [ { "index": { "status": 201 } } ] });
        let result = summarize_bulk_response(2, &body);
        assert!(matches!(result, Err(SearchStoreError::ParseError(_))));
    }

    #[test]
    fn test_bulk_body_pairs_action_and_source() {
        let documents = vec![
            MovieDocument::new(Some("Heat".to_string()), vec![], vec![], None, 1),
            MovieDocument::new(Some("Ran".to_string()), vec![], vec![], None, 2),
        ];

        let body = OpenSearchProvider::bulk_body(&documents).unwrap();

        assert_eq!(body.len(), 4);
    }

    #[tokio::test]
    async fn test_connect_requires_hosts() {
        let result = OpenSearchProvider::connect(
            &[],
            StoreCredentials::new("admin", "admin"),
            CollectionConfig::new("movies"),
        )
        .await;

        assert!(matches!(result, Err(SearchStoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_collection() {
        let result = OpenSearchProvider::connect(
            &["http://localhost:9200".to_string()],
            StoreCredentials::new("admin", "admin"),
            CollectionConfig::new("Movies"),
        )
        .await;

        assert!(matches!(result, Err(SearchStoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_unparseable_host() {
        let result = OpenSearchProvider::connect(
            &["not a url".to_string()],
            StoreCredentials::new("admin", "admin"),
            CollectionConfig::new("movies"),
        )
        .await;

        assert!(matches!(result, Err(SearchStoreError::ConnectionError(_))));
    }

    #[test]
    fn test_summarize_out_of_range_status() {
        let body = json!({
            "items": [ { "index": { "status": 65737, "error": { "reason": "odd status" } } } ]
        });

        let summary = summarize_bulk_response(1, &body).unwrap();

        assert_eq!(summary.failures[0].status, 0);
        assert_eq!(summary.failures[0].reason, "odd status");
    }

    #[tokio::test]
    async fn test_operations_fail_after_close() {
        let provider =
            OpenSearchProvider::unconnected("http://localhost:9200", CollectionConfig::new("movies"))
                .unwrap();

        provider.close().await.unwrap();

        assert!(matches!(
            provider.commit().await,
            Err(SearchStoreError::ConnectionError(_))
        ));
        assert!(matches!(
            provider.collection_exists().await,
            Err(SearchStoreError::ConnectionError(_))
        ));
        let documents = vec![MovieDocument::new(None, vec![], vec![], None, 0)];
        assert!(matches!(
            provider.bulk_insert_documents(&documents).await,
            Err(SearchStoreError::ConnectionError(_))
        ));
        assert!(matches!(
            provider.delete_by_query(json!({ "match_all": {} })).await,
            Err(SearchStoreError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_close_twice_is_an_error() {
        let provider =
            OpenSearchProvider::unconnected("http://localhost:9200", CollectionConfig::new("movies"))
                .unwrap();

        assert!(provider.close().await.is_ok());
        assert!(matches!(
            provider.close().await,
            Err(SearchStoreError::ConnectionError(_))
        ));
    }
}
