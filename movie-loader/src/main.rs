//! Movie Loader Main Entry Point
//!
//! Reads the movies CSV, inserts it once, then optionally times repeated bulk
//! inserts on a background task.

use dotenv::dotenv;
use movie_loader::submitter::SubmissionHandle;
use movie_loader::{Dependencies, IngestError, LoaderError, LoaderSettings};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), LoaderError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("movie_loader=info,movie_loader_repository=info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| LoaderError::config(e.to_string()))?;

        info!(
            service_name = "movie-loader",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| LoaderError::config(e.to_string()))?;

        info!(
            service_name = "movie-loader",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

/// Log progress updates until the run reaches a terminal state.
fn spawn_progress_logger(handle: &SubmissionHandle) {
    let mut progress_rx = handle.subscribe();
    tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let progress = progress_rx.borrow_and_update().clone();
            info!(
                state = ?progress.state,
                completed = progress.batches_completed,
                planned = progress.batches_planned,
                "Background insert progress"
            );
            if progress.state.is_terminal() {
                break;
            }
        }
    });
}

/// Cancel the run on Ctrl-C.
fn spawn_ctrl_c_canceller(handle: &SubmissionHandle) {
    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, cancelling background insert");
            canceller.cancel();
        }
    });
}

async fn run(deps: &Dependencies) -> Result<(), LoaderError> {
    let summary = deps.submitter.insert_batch().await?;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Initial insert completed"
    );

    let docs_to_insert = deps.settings.docs_to_insert;
    if docs_to_insert == 0 {
        return Ok(());
    }

    let mut handle = deps.submitter.spawn_async_insert(docs_to_insert);
    spawn_progress_logger(&handle);
    spawn_ctrl_c_canceller(&handle);

    let report = match handle.wait(deps.settings.async_wait_timeout).await {
        Ok(report) => report,
        Err(e @ IngestError::Timeout(_)) => {
            handle.cancel();
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        elapsed_secs = report.elapsed_secs(),
        batches_completed = report.batches_completed,
        batches_failed = report.batches_failed(),
        cancelled = report.cancelled,
        "Total elapsed time in seconds"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), LoaderError> {
    dotenv().ok();

    init_tracing()?;

    info!("Starting Movie Loader");

    let settings = LoaderSettings::from_env();

    let deps = match Dependencies::new(settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let result = run(&deps).await;

    if let Err(e) = deps.provider.close().await {
        warn!(error = %e, "Failed to close OpenSearch client");
    }

    match result {
        Ok(()) => {
            info!("Movie loader completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Movie loader failed");
            Err(e)
        }
    }
}
