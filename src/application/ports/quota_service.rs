#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::domain::entities::BlobStoreMetrics;

/// Outcome of a quota evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaResult {
    violation: bool,
    blob_store_name: String,
    message: String,
}

impl QuotaResult {
    pub fn new(violation: bool, blob_store_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation,
            blob_store_name: blob_store_name.into(),
            message: message.into(),
        }
    }

    pub fn is_violation(&self) -> bool {
        self.violation
    }

    pub fn blob_store_name(&self) -> &str {
        &self.blob_store_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Port for checking a blob store's usage against its configured quota
#[cfg_attr(test, automock)]
pub trait BlobStoreQuotaService: Send + Sync {
    /// `None` when no quota applies to the blob store
    fn check_quota(&self, blob_store_name: &str, metrics: &BlobStoreMetrics) -> Option<QuotaResult>;
}
