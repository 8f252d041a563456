use std::collections::BTreeMap;

use serde::Serialize;

pub const BLOB_COUNT_PROP_NAME: &str = "blobCount";
pub const TOTAL_SIZE_PROP_NAME: &str = "totalSize";

/// Point-in-time view of a blob store's aggregate metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobStoreMetrics {
    blob_count: u64,
    total_size: u64,
    available_space_by_file_store: BTreeMap<String, u64>,
    unlimited: bool,
}

impl BlobStoreMetrics {
    pub fn new(
        blob_count: u64,
        total_size: u64,
        available_space_by_file_store: BTreeMap<String, u64>,
        unlimited: bool,
    ) -> Self {
        Self {
            blob_count,
            total_size,
            available_space_by_file_store,
            unlimited,
        }
    }

    pub fn blob_count(&self) -> u64 {
        self.blob_count
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Sum over all file stores, saturating at `u64::MAX`
    pub fn available_space(&self) -> u64 {
        self.available_space_by_file_store
            .values()
            .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn available_space_by_file_store(&self) -> &BTreeMap<String, u64> {
        &self.available_space_by_file_store
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }
}
