//! Batch submitter for the movie loader.
//!
//! Submits the in-memory document set to the search store, either once
//! (`insert_batch`) or repeatedly on a single background task
//! (`spawn_async_insert`) to time bulk insert throughput.

mod handle;

pub use handle::{
    IterationFailure, RunReport, SubmissionCanceller, SubmissionHandle, SubmissionProgress,
    SubmitterState,
};

use movie_loader_repository::{BulkInsertSummary, SearchStoreError, SearchStoreProvider};
use movie_loader_shared::MovieDocument;
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::IngestError;

/// Default number of documents counted as one batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// What each iteration of the background loop submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// Re-submit the whole document set every iteration. The store ends up with
    /// one copy of the set per iteration.
    FullSet,
    /// Submit the next `batch_size` documents each iteration, wrapping around
    /// the set when it runs out.
    Chunked,
}

/// Configuration for the batch submitter.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Documents per batch; the loop runs `num_docs_to_insert / batch_size` times.
    pub batch_size: usize,
    pub mode: SubmissionMode,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            mode: SubmissionMode::FullSet,
        }
    }
}

impl SubmitterConfig {
    /// Number of iterations needed for `num_docs_to_insert`. The remainder is dropped.
    pub fn batch_count(&self, num_docs_to_insert: usize) -> usize {
        num_docs_to_insert / self.batch_size
    }
}

/// Owns the document set and submits it to a search store.
///
/// Cloning is cheap: the provider and the documents are shared.
#[derive(Clone)]
pub struct BatchSubmitter {
    provider: Arc<dyn SearchStoreProvider>,
    documents: Arc<[MovieDocument]>,
    config: SubmitterConfig,
}

impl BatchSubmitter {
    /// Create a submitter with the default configuration.
    pub fn new(provider: Arc<dyn SearchStoreProvider>, documents: Vec<MovieDocument>) -> Self {
        Self {
            provider,
            documents: documents.into(),
            config: SubmitterConfig::default(),
        }
    }

    /// Create a submitter with custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchStoreProvider>,
        documents: Vec<MovieDocument>,
        config: SubmitterConfig,
    ) -> Result<Self, IngestError> {
        if config.batch_size == 0 {
            return Err(IngestError::config("batch_size must be greater than zero"));
        }

        Ok(Self {
            provider,
            documents: documents.into(),
            config,
        })
    }

    pub fn documents(&self) -> &[MovieDocument] {
        &self.documents
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Submit the whole document set in one request, then commit.
    #[instrument(skip(self), fields(collection = %self.provider.collection(), count = self.documents.len()))]
    pub async fn insert_batch(&self) -> Result<BulkInsertSummary, IngestError> {
        let summary = self.submit(&self.documents).await?;
        Ok(summary)
    }

    /// Delete every document in the collection, then commit.
    #[instrument(skip(self), fields(collection = %self.provider.collection()))]
    pub async fn clear_collection(&self) -> Result<u64, IngestError> {
        let deleted = self
            .provider
            .delete_by_query(json!({ "match_all": {} }))
            .await?;
        self.provider.commit().await?;

        info!(deleted = deleted, "Collection cleared");
        Ok(deleted)
    }

    async fn submit(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BulkInsertSummary, SearchStoreError> {
        let summary = self.provider.bulk_insert_documents(documents).await?;

        if summary.has_failures() {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk insert completed with some failures"
            );
            for failure in &summary.failures {
                debug!(
                    position = failure.position,
                    status = failure.status,
                    reason = %failure.reason,
                    "Document rejected"
                );
            }
        }

        self.provider.commit().await?;
        Ok(summary)
    }

    fn documents_for_iteration(&self, iteration: usize) -> Cow<'_, [MovieDocument]> {
        match self.config.mode {
            SubmissionMode::FullSet => Cow::Borrowed(&self.documents[..]),
            SubmissionMode::Chunked => {
                let len = self.documents.len();
                if len == 0 {
                    return Cow::Borrowed(&[]);
                }

                let size = self.config.batch_size;
                let start = iteration.wrapping_mul(size) % len;
                if start + size <= len {
                    Cow::Borrowed(&self.documents[start..start + size])
                } else {
                    Cow::Owned(
                        self.documents
                            .iter()
                            .cycle()
                            .skip(start)
                            .take(size)
                            .cloned()
                            .collect(),
                    )
                }
            }
        }
    }

    /// Submit `num_docs_to_insert / batch_size` batches on a background task.
    ///
    /// Returns immediately. A failed iteration is logged and recorded in the
    /// report, and the loop moves on to the next one.
    pub fn spawn_async_insert(&self, num_docs_to_insert: usize) -> SubmissionHandle {
        let batches = self.config.batch_count(num_docs_to_insert);
        info!(
            num_docs_to_insert = num_docs_to_insert,
            batches = batches,
            mode = ?self.config.mode,
            "Total batches to insert"
        );

        let (progress_tx, progress_rx) = watch::channel(SubmissionProgress::idle(batches));
        let (cancel_tx, cancel_rx) = broadcast::channel(1);

        let submitter = self.clone();
        let join =
            tokio::spawn(async move { submitter.run_batches(batches, progress_tx, cancel_rx).await });

        SubmissionHandle::new(progress_rx, cancel_tx, join)
    }

    async fn run_batches(
        self,
        batches: usize,
        progress_tx: watch::Sender<SubmissionProgress>,
        mut cancel_rx: broadcast::Receiver<()>,
    ) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport {
            batches_planned: batches,
            batches_completed: 0,
            documents_submitted: 0,
            documents_rejected: 0,
            failures: Vec::new(),
            elapsed: Default::default(),
            cancelled: false,
        };

        progress_tx.send_modify(|p| p.state = SubmitterState::Running);

        for iteration in 0..batches {
            let documents = self.documents_for_iteration(iteration);

            let outcome = tokio::select! {
                biased;
                _ = wait_for_cancel(&mut cancel_rx) => None,
                result = self.submit(&documents) => Some(result),
            };

            match outcome {
                None => {
                    warn!(
                        completed = report.batches_completed,
                        planned = batches,
                        "Background insert cancelled"
                    );
                    report.cancelled = true;
                    break;
                }
                Some(Ok(summary)) => {
                    report.documents_submitted += summary.succeeded;
                    report.documents_rejected += summary.failed;
                }
                Some(Err(e)) => {
                    error!(iteration = iteration, error = %e, "Unable to add documents");
                    report.failures.push(IterationFailure {
                        iteration,
                        error: e,
                    });
                }
            }

            report.batches_completed += 1;
            progress_tx.send_modify(|p| p.batches_completed = report.batches_completed);
            debug!(batches_inserted = report.batches_completed, "Batches inserted so far");
        }

        report.elapsed = started.elapsed();
        let final_state = if report.cancelled {
            SubmitterState::Cancelled
        } else {
            SubmitterState::Done
        };
        progress_tx.send_modify(|p| {
            p.state = final_state;
            p.elapsed = Some(report.elapsed);
        });

        info!(
            batches_completed = report.batches_completed,
            batches_failed = report.batches_failed(),
            documents_submitted = report.documents_submitted,
            elapsed_secs = report.elapsed_secs(),
            "Background insert finished"
        );
        report
    }
}

/// Resolve when a cancel signal arrives. A dropped handle never cancels the run.
async fn wait_for_cancel(cancel_rx: &mut broadcast::Receiver<()>) {
    match cancel_rx.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock store recording every bulk request size.
    struct MockStoreProvider {
        bulk_sizes: std::sync::Mutex<Vec<usize>>,
        commits: AtomicUsize,
    }

    impl MockStoreProvider {
        fn new() -> Self {
            Self {
                bulk_sizes: std::sync::Mutex::new(Vec::new()),
                commits: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchStoreProvider for MockStoreProvider {
        fn collection(&self) -> &str {
            "movies"
        }

        async fn collection_exists(&self) -> Result<bool, SearchStoreError> {
            Ok(true)
        }

        async fn create_collection(&self) -> Result<(), SearchStoreError> {
            Ok(())
        }

        async fn delete_collection(&self) -> Result<(), SearchStoreError> {
            Ok(())
        }

        async fn bulk_insert_documents(
            &self,
            documents: &[MovieDocument],
        ) -> Result<BulkInsertSummary, SearchStoreError> {
            self.bulk_sizes.lock().unwrap().push(documents.len());
            Ok(BulkInsertSummary::all_succeeded(documents.len()))
        }

        async fn delete_by_query(&self, _query: Value) -> Result<u64, SearchStoreError> {
            Ok(5)
        }

        async fn commit(&self) -> Result<(), SearchStoreError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<(), SearchStoreError> {
            Ok(())
        }
    }

    fn documents(count: usize) -> Vec<MovieDocument> {
        (0..count)
            .map(|i| MovieDocument::new(Some(format!("Movie {}", i)), vec![], vec![], None, 0))
            .collect()
    }

    #[test]
    fn test_batch_count_truncates() {
        let config = SubmitterConfig::default();

        assert_eq!(config.batch_count(2500), 2);
        assert_eq!(config.batch_count(999), 0);
        assert_eq!(config.batch_count(1000), 1);
        assert_eq!(config.batch_count(0), 0);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let provider = Arc::new(MockStoreProvider::new());
        let config = SubmitterConfig {
            batch_size: 0,
            mode: SubmissionMode::FullSet,
        };

        let result = BatchSubmitter::with_config(provider, documents(1), config);

        assert!(matches!(result, Err(IngestError::Config(_))));
    }

    #[tokio::test]
    async fn test_insert_batch_submits_everything_then_commits() {
        let provider = Arc::new(MockStoreProvider::new());
        let submitter = BatchSubmitter::new(provider.clone(), documents(3));

        let summary = submitter.insert_batch().await.unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(*provider.bulk_sizes.lock().unwrap(), vec![3]);
        assert_eq!(provider.commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_collection_commits() {
        let provider = Arc::new(MockStoreProvider::new());
        let submitter = BatchSubmitter::new(provider.clone(), documents(1));

        let deleted = submitter.clear_collection().await.unwrap();

        assert_eq!(deleted, 5);
        assert_eq!(provider.commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chunked_mode_cycles_through_documents() {
        let provider = Arc::new(MockStoreProvider::new());
        let config = SubmitterConfig {
            batch_size: 2,
            mode: SubmissionMode::Chunked,
        };
        let submitter = BatchSubmitter::with_config(provider, documents(3), config).unwrap();

        let names = |iteration| -> Vec<String> {
            submitter
                .documents_for_iteration(iteration)
                .iter()
                .filter_map(|d| d.name.clone())
                .collect()
        };

        assert_eq!(names(0), vec!["Movie 0", "Movie 1"]);
        assert_eq!(names(1), vec!["Movie 2", "Movie 0"]);
        assert_eq!(names(2), vec!["Movie 1", "Movie 2"]);
    }

    #[test]
    fn test_chunked_mode_with_batch_larger_than_set() {
        let provider = Arc::new(MockStoreProvider::new());
        let config = SubmitterConfig {
            batch_size: 5,
            mode: SubmissionMode::Chunked,
        };
        let submitter = BatchSubmitter::with_config(provider, documents(2), config).unwrap();

        assert_eq!(submitter.documents_for_iteration(0).len(), 5);
    }

    #[test]
    fn test_full_set_mode_reuses_all_documents() {
        let provider = Arc::new(MockStoreProvider::new());
        let submitter = BatchSubmitter::new(provider, documents(4));

        assert_eq!(submitter.documents_for_iteration(0).len(), 4);
        assert_eq!(submitter.documents_for_iteration(7).len(), 4);
    }
}
