//! Dependency initialization and wiring for the movie loader.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{ConnectionMode, LoaderSettings};
use crate::mapper::RecordMapper;
use crate::reader::read_csv_into_memory;
use crate::submitter::BatchSubmitter;
use crate::LoaderError;
use movie_loader_repository::{
    CollectionConfig, OpenSearchProvider, SearchStoreProvider, StoreCredentials,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: LoaderSettings,
    /// Shared with the submitter; used directly to close the client on shutdown.
    pub provider: Arc<dyn SearchStoreProvider>,
    /// Holds the mapped document set, ready to submit.
    pub submitter: BatchSubmitter,
}

impl Dependencies {
    /// Initialize all dependencies from `settings`.
    ///
    /// Connects to the cluster, prepares the collection, then reads and maps
    /// the CSV. See [`LoaderSettings::from_env`] for the variables involved.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(LoaderError)` - If initialization fails (connection only in fail-fast mode)
    pub async fn new(settings: LoaderSettings) -> Result<Self, LoaderError> {
        info!(
            opensearch_hosts = ?settings.opensearch_hosts,
            collection = %settings.collection_name,
            csv_path = %settings.csv_path.display(),
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        let mut collection = CollectionConfig::new(settings.collection_name.clone());
        if let Some(dir) = &settings.collection_config_dir {
            collection = collection.with_config_dir(dir.clone());
        }

        let provider = Self::connect_to_opensearch(
            &settings.opensearch_hosts,
            settings.credentials.clone(),
            collection,
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        Self::with_provider(settings, Arc::new(provider)).await
    }

    /// Wire the loader around an already connected provider.
    pub async fn with_provider(
        settings: LoaderSettings,
        provider: Arc<dyn SearchStoreProvider>,
    ) -> Result<Self, LoaderError> {
        prepare_collection(provider.as_ref(), settings.recreate_collection).await?;

        let records = read_csv_into_memory(&settings.csv_path)?;
        let documents = RecordMapper::new(settings.mapper.clone()).map_records(&records)?;

        let submitter =
            BatchSubmitter::with_config(provider.clone(), documents, settings.submitter.clone())?;

        if settings.clear_collection {
            submitter.clear_collection().await?;
        }

        Ok(Self {
            settings,
            provider,
            submitter,
        })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        hosts: &[String],
        credentials: StoreCredentials,
        collection: CollectionConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, LoaderError> {
        loop {
            match OpenSearchProvider::connect(hosts, credentials.clone(), collection.clone()).await
            {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        error!(
                            opensearch_hosts = ?hosts,
                            error = %e,
                            "Failed to connect to OpenSearch"
                        );
                        return Err(e.into());
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_hosts = ?hosts,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}

/// Make sure the collection is ready to receive documents.
///
/// With `recreate`, an existing collection is deleted first so it comes back
/// with the configured settings; otherwise it is only created when missing.
pub async fn prepare_collection(
    provider: &dyn SearchStoreProvider,
    recreate: bool,
) -> Result<(), LoaderError> {
    if recreate {
        info!(collection = %provider.collection(), "Recreating collection");
        provider.delete_collection().await?;
        provider.create_collection().await?;
        return Ok(());
    }

    provider.ensure_collection_exists().await?;
    Ok(())
}
