use async_trait::async_trait;

use crate::application::metrics::AccumulatingBlobStoreMetrics;
use crate::application::ports::{PropertiesFile, StorageError};

/// Lazily produced metrics resources, one per node
pub type BackingFiles<F> = Box<dyn Iterator<Item = F> + Send>;

/// Extension point a storage backend implements to persist blob store
/// metrics. [`BlobStoreMetricsStoreSupport`](super::BlobStoreMetricsStoreSupport)
/// drives accumulation, flushing and quota checks on top of it.
#[async_trait]
pub trait MetricsBackend: Send + Sync + 'static {
    type File: PropertiesFile + 'static;

    /// This node's own metrics resource
    fn properties(&self) -> Self::File;

    /// Fresh zeroed accumulator carrying the backend's available-space policy
    fn accumulating_metrics(&self) -> AccumulatingBlobStoreMetrics;

    /// Every node's persisted metrics resource
    async fn backing_files(&self) -> Result<BackingFiles<Self::File>, StorageError>;

    /// Delete all persisted metrics resources
    async fn remove(&self) -> Result<(), StorageError>;
}
