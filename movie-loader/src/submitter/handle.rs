//! Handle, progress and report types for background submission runs.

use movie_loader_repository::SearchStoreError;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::errors::IngestError;

/// Lifecycle of a background submission run.
///
/// `Idle -> Running -> Done`, or `Cancelled` when the caller cancels. Failed
/// iterations are recorded in the report and do not end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitterState {
    Idle,
    Running,
    Done,
    Cancelled,
}

impl SubmitterState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

/// Snapshot published by the worker after every iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionProgress {
    pub state: SubmitterState,
    pub batches_planned: usize,
    pub batches_completed: usize,
    /// Set once the run reaches a terminal state.
    pub elapsed: Option<Duration>,
}

impl SubmissionProgress {
    pub(crate) fn idle(batches_planned: usize) -> Self {
        Self {
            state: SubmitterState::Idle,
            batches_planned,
            batches_completed: 0,
            elapsed: None,
        }
    }
}

/// One failed iteration of the loop.
#[derive(Debug, Clone)]
pub struct IterationFailure {
    /// Zero-based iteration index.
    pub iteration: usize,
    pub error: SearchStoreError,
}

/// Outcome of a background submission run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub batches_planned: usize,
    /// Iterations that ran to completion, successful or not.
    pub batches_completed: usize,
    /// Documents the store accepted across all iterations.
    pub documents_submitted: usize,
    /// Documents the store rejected individually across all iterations.
    pub documents_rejected: usize,
    pub failures: Vec<IterationFailure>,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl RunReport {
    /// Total wall-clock time in whole seconds, truncated.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.as_secs()
    }

    pub fn batches_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Cancels a background run. Cheap to clone and safe to use from other tasks.
#[derive(Debug, Clone)]
pub struct SubmissionCanceller {
    tx: broadcast::Sender<()>,
}

impl SubmissionCanceller {
    /// Stop the run. The in-flight request is abandoned; no further iterations start.
    pub fn cancel(&self) {
        let _ = self.tx.send(());
    }
}

/// Handle to a background submission run.
///
/// Dropping the handle does not stop the run.
pub struct SubmissionHandle {
    progress_rx: watch::Receiver<SubmissionProgress>,
    cancel_tx: broadcast::Sender<()>,
    join: Option<JoinHandle<RunReport>>,
    report: Option<RunReport>,
}

impl SubmissionHandle {
    pub(crate) fn new(
        progress_rx: watch::Receiver<SubmissionProgress>,
        cancel_tx: broadcast::Sender<()>,
        join: JoinHandle<RunReport>,
    ) -> Self {
        Self {
            progress_rx,
            cancel_tx,
            join: Some(join),
            report: None,
        }
    }

    /// Latest progress snapshot.
    pub fn progress(&self) -> SubmissionProgress {
        self.progress_rx.borrow().clone()
    }

    pub fn state(&self) -> SubmitterState {
        self.progress_rx.borrow().state
    }

    /// Whether the run has finished, for callers that poll.
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Receiver that is notified on every progress update.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionProgress> {
        self.progress_rx.clone()
    }

    pub fn canceller(&self) -> SubmissionCanceller {
        SubmissionCanceller {
            tx: self.cancel_tx.clone(),
        }
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(());
    }

    /// Wait for the run to finish and return its report.
    ///
    /// With a timeout, `IngestError::Timeout` is returned if the run is still going
    /// when it elapses; the run keeps going and `wait` can be called again.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<RunReport, IngestError> {
        if let Some(report) = &self.report {
            return Ok(report.clone());
        }

        let join = self
            .join
            .as_mut()
            .ok_or_else(|| IngestError::join("submission task result is unavailable"))?;

        let joined = match timeout {
            Some(limit) => tokio::time::timeout(limit, join)
                .await
                .map_err(|_| IngestError::Timeout(limit))?,
            None => join.await,
        };

        // The task has finished; never poll its JoinHandle again.
        self.join = None;
        let report = joined.map_err(|e| IngestError::join(e.to_string()))?;
        self.report = Some(report.clone());
        Ok(report)
    }
}
