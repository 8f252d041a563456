mod accumulating;
mod backend;
mod config;
mod store_support;

pub use accumulating::AccumulatingBlobStoreMetrics;
pub use backend::{BackingFiles, MetricsBackend};
pub use config::MetricsStoreSettings;
pub use store_support::BlobStoreMetricsStoreSupport;
