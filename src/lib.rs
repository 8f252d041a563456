//! # Swift BlobStore - OpenStack Swift persistence for blob store metadata
//!
//! Stores a blob store's per-blob attributes and per-node metrics as
//! `.properties` objects in a Swift container.
//!
//! ## Architecture Layers
//!
//! - **Domain**: properties codec, blob attributes and metrics records
//! - **Application**: ports, attribute support, metrics accumulation,
//!   periodic jobs and quota checks
//! - **Infrastructure**: Swift HTTP client, Swift adapters, in-memory storage
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use swift_blobstore::application::metrics::{BlobStoreMetricsStoreSupport, MetricsStoreSettings};
//! use swift_blobstore::application::scheduler::PeriodicJobService;
//! use swift_blobstore::infrastructure::{InMemoryObjectStorage, SwiftBlobStoreMetricsStore};
//! use swift_blobstore::value_objects::NodeId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SwiftBlobStoreMetricsStore::builder()
//!     .node_id(NodeId::new("node-1")?)?
//!     .container("blobs")?
//!     .storage(Arc::new(InMemoryObjectStorage::with_container("blobs")))?
//!     .build()?;
//! let store = Arc::new(BlobStoreMetricsStoreSupport::new(
//!     "default",
//!     backend,
//!     PeriodicJobService::new(),
//!     MetricsStoreSettings::default(),
//! ));
//! store.start().await?;
//! store.record_addition(1024);
//! store.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{errors, metrics, ports};
pub use config::{Config, ConfigError};
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
