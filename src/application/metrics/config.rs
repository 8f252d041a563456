use std::time::Duration;

/// Timing for the metrics store's background jobs
#[derive(Debug, Clone)]
pub struct MetricsStoreSettings {
    /// How often dirty counters are written out
    pub flush_interval: Duration,
    /// How often the quota service is consulted
    pub quota_check_interval: Duration,
    /// Maximum number of backing files loaded concurrently when aggregating
    pub load_concurrency: usize,
}

impl Default for MetricsStoreSettings {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(2),
            quota_check_interval: Duration::from_secs(60),
            load_concurrency: 4,
        }
    }
}

impl MetricsStoreSettings {
    pub fn new(flush_interval: Duration, quota_check_interval: Duration) -> Self {
        Self {
            flush_interval,
            quota_check_interval,
            ..Self::default()
        }
    }
}
