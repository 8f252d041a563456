use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::entities::BlobStoreMetrics;

/// In-memory running totals of a blob store's content.
///
/// Counters saturate at zero so a deletion recorded for a blob that was
/// never counted cannot drive them negative.
#[derive(Debug)]
pub struct AccumulatingBlobStoreMetrics {
    blob_count: AtomicU64,
    total_size: AtomicU64,
    available_space_by_file_store: BTreeMap<String, u64>,
    unlimited: bool,
}

impl AccumulatingBlobStoreMetrics {
    pub fn new(
        blob_count: u64,
        total_size: u64,
        available_space_by_file_store: BTreeMap<String, u64>,
        unlimited: bool,
    ) -> Self {
        Self {
            blob_count: AtomicU64::new(blob_count),
            total_size: AtomicU64::new(total_size),
            available_space_by_file_store,
            unlimited,
        }
    }

    pub fn add(&self, blob_count: u64, total_size: u64) {
        update(&self.blob_count, |c| c.saturating_add(blob_count));
        update(&self.total_size, |s| s.saturating_add(total_size));
    }

    pub fn subtract(&self, blob_count: u64, total_size: u64) {
        update(&self.blob_count, |c| c.saturating_sub(blob_count));
        update(&self.total_size, |s| s.saturating_sub(total_size));
    }

    pub fn blob_count(&self) -> u64 {
        self.blob_count.load(Ordering::SeqCst)
    }

    pub fn total_size(&self) -> u64 {
        self.total_size.load(Ordering::SeqCst)
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }

    pub fn snapshot(&self) -> BlobStoreMetrics {
        BlobStoreMetrics::new(
            self.blob_count(),
            self.total_size(),
            self.available_space_by_file_store.clone(),
            self.unlimited,
        )
    }
}

fn update(counter: &AtomicU64, f: impl Fn(u64) -> u64) {
    // The closure never returns None, so the update always succeeds.
    let _ = counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| Some(f(current)));
}
