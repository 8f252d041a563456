use crate::application::ports::{BlobStoreQuotaService, QuotaResult};
use crate::domain::entities::BlobStoreMetrics;

/// Quota on the total bytes stored by a blob store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceUsedQuota {
    limit_bytes: u64,
}

impl SpaceUsedQuota {
    pub fn new(limit_bytes: u64) -> Self {
        Self { limit_bytes }
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }
}

impl BlobStoreQuotaService for SpaceUsedQuota {
    fn check_quota(&self, blob_store_name: &str, metrics: &BlobStoreMetrics) -> Option<QuotaResult> {
        let used = metrics.total_size();
        let violation = used > self.limit_bytes;
        let message = if violation {
            format!(
                "Blob store {} is using {} bytes, over its quota of {} bytes",
                blob_store_name, used, self.limit_bytes
            )
        } else {
            format!(
                "Blob store {} is using {} of {} bytes",
                blob_store_name, used, self.limit_bytes
            )
        };
        Some(QuotaResult::new(violation, blob_store_name, message))
    }
}
