use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::application::errors::MetricsStoreError;
use crate::application::metrics::{AccumulatingBlobStoreMetrics, BackingFiles, MetricsBackend};
use crate::application::ports::{ObjectStorage, PropertiesFile, StorageError};
use crate::domain::value_objects::NodeId;

use super::{Directory, SwiftPropertiesFile};

/// Subdirectory holding every node's metrics object
pub const METRICS_DIRECTORY: &str = "metrics";
pub const METRICS_EXTENSION: &str = ".properties";
const METRICS_FILE_SUFFIX: &str = "-metrics.properties";

/// Name the available space is reported under
pub const SWIFT_FILE_STORE: &str = "swift";

/// Metrics backend keeping one properties object per node under the
/// container's `metrics/` directory.
///
/// Swift has no capacity limit the store can observe, so available space is
/// reported as unlimited.
pub struct SwiftBlobStoreMetricsStore {
    storage: Arc<dyn ObjectStorage>,
    container: String,
    node_id: NodeId,
    directory: Directory,
    file_name: String,
}

impl SwiftBlobStoreMetricsStore {
    pub fn builder() -> SwiftBlobStoreMetricsStoreBuilder {
        SwiftBlobStoreMetricsStoreBuilder::default()
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// This node's metrics object name, relative to the metrics directory
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn file(&self, key: impl Into<String>) -> SwiftPropertiesFile {
        SwiftPropertiesFile::new(
            Arc::clone(&self.storage),
            self.container.clone(),
            Some(self.directory.clone()),
            key,
        )
    }
}

impl fmt::Debug for SwiftBlobStoreMetricsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftBlobStoreMetricsStore")
            .field("container", &self.container)
            .field("node_id", &self.node_id)
            .field("directory", &self.directory)
            .finish()
    }
}

#[async_trait]
impl MetricsBackend for SwiftBlobStoreMetricsStore {
    type File = SwiftPropertiesFile;

    fn properties(&self) -> SwiftPropertiesFile {
        self.file(self.file_name.clone())
    }

    fn accumulating_metrics(&self) -> AccumulatingBlobStoreMetrics {
        let mut available = BTreeMap::new();
        available.insert(SWIFT_FILE_STORE.to_string(), u64::MAX);
        AccumulatingBlobStoreMetrics::new(0, 0, available, true)
    }

    async fn backing_files(&self) -> Result<BackingFiles<SwiftPropertiesFile>, StorageError> {
        let summaries = match self
            .storage
            .list_directory(
                &self.container,
                &self.directory.prefix(),
                self.directory.delimiter(),
            )
            .await
        {
            Ok(summaries) => summaries,
            Err(StorageError::NotFound(_)) => {
                debug!("Container {} not found, no metrics files", self.container);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let storage = Arc::clone(&self.storage);
        let container = self.container.clone();
        let directory = self.directory.clone();

        Ok(Box::new(
            summaries
                .into_iter()
                .filter(|summary| summary.name.ends_with(METRICS_EXTENSION))
                .map(move |summary| {
                    let key = directory
                        .relative(&summary.name)
                        .unwrap_or(summary.name.as_str())
                        .to_string();
                    SwiftPropertiesFile::new(
                        Arc::clone(&storage),
                        container.clone(),
                        Some(directory.clone()),
                        key,
                    )
                }),
        ))
    }

    async fn remove(&self) -> Result<(), StorageError> {
        for file in self.backing_files().await? {
            debug!("Removing {}", file);
            file.remove().await?;
        }
        Ok(())
    }
}

/// Builder for [`SwiftBlobStoreMetricsStore`]. Node id, container and
/// storage are each set exactly once.
#[derive(Default)]
pub struct SwiftBlobStoreMetricsStoreBuilder {
    node_id: Option<NodeId>,
    container: Option<String>,
    storage: Option<Arc<dyn ObjectStorage>>,
}

impl SwiftBlobStoreMetricsStoreBuilder {
    pub fn node_id(mut self, node_id: NodeId) -> Result<Self, MetricsStoreError> {
        if self.node_id.is_some() {
            return Err(MetricsStoreError::AlreadyInitialized("node_id"));
        }
        self.node_id = Some(node_id);
        Ok(self)
    }

    pub fn container(mut self, container: impl Into<String>) -> Result<Self, MetricsStoreError> {
        if self.container.is_some() {
            return Err(MetricsStoreError::AlreadyInitialized("container"));
        }
        let container = container.into();
        if container.trim().is_empty() || container.contains('/') {
            return Err(MetricsStoreError::InvalidContainer(container));
        }
        self.container = Some(container);
        Ok(self)
    }

    pub fn storage(mut self, storage: Arc<dyn ObjectStorage>) -> Result<Self, MetricsStoreError> {
        if self.storage.is_some() {
            return Err(MetricsStoreError::AlreadyInitialized("storage"));
        }
        self.storage = Some(storage);
        Ok(self)
    }

    pub fn build(self) -> Result<SwiftBlobStoreMetricsStore, MetricsStoreError> {
        let node_id = self.node_id.ok_or(MetricsStoreError::MissingField("node_id"))?;
        let container = self
            .container
            .ok_or(MetricsStoreError::MissingField("container"))?;
        let storage = self.storage.ok_or(MetricsStoreError::MissingField("storage"))?;

        let file_name = format!("{}{}", node_id.as_str(), METRICS_FILE_SUFFIX);
        Ok(SwiftBlobStoreMetricsStore {
            storage,
            container,
            node_id,
            directory: Directory::new(METRICS_DIRECTORY, '/'),
            file_name,
        })
    }
}
