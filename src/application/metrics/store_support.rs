use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, trace, warn};

use crate::application::errors::MetricsStoreError;
use crate::application::metrics::{
    AccumulatingBlobStoreMetrics, MetricsBackend, MetricsStoreSettings,
};
use crate::application::ports::{BlobStoreQuotaService, PropertiesFile, QuotaResult, StorageError};
use crate::application::scheduler::{JobResult, PeriodicJob, PeriodicJobService};
use crate::domain::entities::{BlobStoreMetrics, BLOB_COUNT_PROP_NAME, TOTAL_SIZE_PROP_NAME};
use crate::domain::value_objects::Properties;

/// Keeps a blob store's metrics in memory and periodically writes them to
/// the node's metrics resource through a [`MetricsBackend`].
///
/// Lifecycle:
/// - `start` loads this node's persisted counters (or writes zeroed ones)
///   and schedules the flush job and, when a quota service is set, the
///   quota-check job
/// - `record_addition` / `record_deletion` adjust the counters; anything
///   recorded before `start` is added onto the loaded values
/// - `stop` cancels the jobs and writes the counters one final time
/// - `remove` cancels the jobs and deletes every node's metrics resource
///
/// Jobs hold only a weak reference to the store, so dropping the last
/// `Arc` ends them as well.
pub struct BlobStoreMetricsStoreSupport<B: MetricsBackend> {
    blob_store_name: String,
    backend: B,
    settings: MetricsStoreSettings,
    job_service: PeriodicJobService,
    quota_service: Option<Arc<dyn BlobStoreQuotaService>>,
    metrics: AccumulatingBlobStoreMetrics,
    properties: AsyncMutex<B::File>,
    own_file: String,
    dirty: AtomicBool,
    started: AtomicBool,
    jobs: Mutex<Vec<PeriodicJob>>,
}

impl<B: MetricsBackend> BlobStoreMetricsStoreSupport<B> {
    pub fn new(
        blob_store_name: impl Into<String>,
        backend: B,
        job_service: PeriodicJobService,
        settings: MetricsStoreSettings,
    ) -> Self {
        let properties = backend.properties();
        let own_file = properties.to_string();
        let metrics = backend.accumulating_metrics();

        Self {
            blob_store_name: blob_store_name.into(),
            backend,
            settings,
            job_service,
            quota_service: None,
            metrics,
            properties: AsyncMutex::new(properties),
            own_file,
            dirty: AtomicBool::new(false),
            started: AtomicBool::new(false),
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_quota_service(mut self, quota_service: Arc<dyn BlobStoreQuotaService>) -> Self {
        self.quota_service = Some(quota_service);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn blob_store_name(&self) -> &str {
        &self.blob_store_name
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub async fn start(self: &Arc<Self>) -> Result<(), MetricsStoreError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(MetricsStoreError::AlreadyStarted);
        }

        if let Err(e) = self.load_or_initialize().await {
            self.started.store(false, Ordering::SeqCst);
            return Err(e);
        }

        self.schedule_jobs();
        Ok(())
    }

    async fn load_or_initialize(&self) -> Result<(), MetricsStoreError> {
        let mut properties = self.properties.lock().await;

        if properties.exists().await? {
            info!("Loading blob store metrics file {}", *properties);
            properties.load().await?;
            let (blob_count, total_size) = read_counters(&*properties)?;
            self.metrics.add(blob_count, total_size);
        } else {
            info!(
                "Blob store metrics file {} not found - initializing at zero.",
                *properties
            );
            self.write_counters(properties.properties_mut());
            properties.store().await?;
        }

        Ok(())
    }

    fn schedule_jobs(self: &Arc<Self>) {
        let mut jobs = self.jobs.lock();

        let weak = Arc::downgrade(self);
        jobs.push(self.job_service.schedule(
            format!("{}-metrics-flush", self.blob_store_name),
            self.settings.flush_interval,
            move || {
                let weak = weak.clone();
                async move {
                    let result: JobResult = match weak.upgrade() {
                        Some(store) => store.flush().await.map_err(Into::into),
                        None => Ok(()),
                    };
                    result
                }
            },
        ));

        if self.quota_service.is_some() {
            let weak = Arc::downgrade(self);
            jobs.push(self.job_service.schedule(
                format!("{}-quota-check", self.blob_store_name),
                self.settings.quota_check_interval,
                move || {
                    let weak = weak.clone();
                    async move {
                        let result: JobResult = match weak.upgrade() {
                            Some(store) => store.check_quota().await.map(|_| ()).map_err(Into::into),
                            None => Ok(()),
                        };
                        result
                    }
                },
            ));
        }
    }

    /// Before `start`, a deletion can only offset additions recorded before
    /// `start`; counters never drop below zero.
    pub fn record_addition(&self, size: u64) {
        self.metrics.add(1, size);
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub fn record_deletion(&self, size: u64) {
        self.metrics.subtract(1, size);
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// This node's live counters, without consulting storage
    pub fn local_metrics(&self) -> BlobStoreMetrics {
        self.metrics.snapshot()
    }

    /// Write the counters if they changed since the last write
    pub async fn flush(&self) -> Result<(), StorageError> {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(e) = self.write_out().await {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    async fn write_out(&self) -> Result<(), StorageError> {
        let mut properties = self.properties.lock().await;
        self.write_counters(properties.properties_mut());
        trace!("Writing blob store metrics file {}", *properties);
        properties.store().await
    }

    fn write_counters(&self, properties: &mut Properties) {
        properties.set(BLOB_COUNT_PROP_NAME, self.metrics.blob_count().to_string());
        properties.set(TOTAL_SIZE_PROP_NAME, self.metrics.total_size().to_string());
    }

    /// Aggregate metrics across every node.
    ///
    /// Once started, this node contributes its live counters and every other
    /// node its last persisted ones. Before start, all nodes are read from
    /// storage. Resources that cannot be loaded are logged and skipped.
    pub async fn metrics(&self) -> Result<BlobStoreMetrics, StorageError> {
        let combined = self.backend.accumulating_metrics();
        let started = self.is_started();
        if started {
            combined.add(self.metrics.blob_count(), self.metrics.total_size());
        }

        let files: Vec<B::File> = self
            .backend
            .backing_files()
            .await?
            .filter(|file| !started || file.to_string() != self.own_file)
            .collect();

        let loaded: Vec<(B::File, Result<(u64, u64), StorageError>)> = stream::iter(files)
            .map(|mut file| async move {
                let counters = match file.load().await {
                    Ok(()) => read_counters(&file),
                    Err(e) => Err(e),
                };
                (file, counters)
            })
            .buffer_unordered(self.settings.load_concurrency.max(1))
            .collect()
            .await;

        for (file, counters) in loaded {
            match counters {
                Ok((blob_count, total_size)) => combined.add(blob_count, total_size),
                Err(e) => error!("Unable to load properties file {}. Skipping: {}", file, e),
            }
        }

        Ok(combined.snapshot())
    }

    /// Consult the quota service, logging a warning on violation
    pub async fn check_quota(&self) -> Result<Option<QuotaResult>, StorageError> {
        let Some(quota_service) = &self.quota_service else {
            return Ok(None);
        };

        let metrics = self.metrics().await?;
        let result = quota_service.check_quota(&self.blob_store_name, &metrics);
        if let Some(quota) = &result {
            if quota.is_violation() {
                warn!("{}", quota.message());
            } else {
                debug!("Quota check passed for blob store {}", self.blob_store_name);
            }
        }
        Ok(result)
    }

    /// Cancel the jobs and write the counters one final time.
    ///
    /// When that write fails the store stays started and dirty, so a later
    /// `stop` or `flush` writes the counters again.
    pub async fn stop(&self) -> Result<(), StorageError> {
        self.cancel_jobs();
        if !self.is_started() {
            return Ok(());
        }

        self.dirty.store(true, Ordering::SeqCst);
        self.flush().await?;
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub async fn remove(&self) -> Result<(), StorageError> {
        self.cancel_jobs();
        self.started.store(false, Ordering::SeqCst);
        self.dirty.store(false, Ordering::SeqCst);
        self.backend.remove().await
    }

    fn cancel_jobs(&self) {
        let jobs: Vec<PeriodicJob> = self.jobs.lock().drain(..).collect();
        for job in jobs {
            job.cancel();
        }
    }
}

fn read_counters<F: PropertiesFile>(file: &F) -> Result<(u64, u64), StorageError> {
    let parse = |key: &str| {
        file.properties()
            .get_or(key, "0")
            .trim()
            .parse::<u64>()
            .map_err(|e| StorageError::Malformed {
                name: file.to_string(),
                reason: format!("{}: {}", key, e),
            })
    };
    Ok((parse(BLOB_COUNT_PROP_NAME)?, parse(TOTAL_SIZE_PROP_NAME)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics::BackingFiles;
    use crate::application::ports::MockBlobStoreQuotaService;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::time::Duration;

    /// Objects shared by every test file, plus a switch that fails writes
    #[derive(Clone, Default)]
    struct SharedObjects(Arc<Mutex<BTreeMap<String, String>>>, Arc<AtomicBool>);

    impl SharedObjects {
        fn fail_writes(&self, fail: bool) {
            self.1.store(fail, Ordering::SeqCst);
        }

        fn put(&self, name: &str, text: &str) {
            self.0.lock().insert(name.to_string(), text.to_string());
        }

        fn get(&self, name: &str) -> Option<Properties> {
            self.0
                .lock()
                .get(name)
                .map(|text| Properties::parse(text).unwrap())
        }

        fn contains(&self, name: &str) -> bool {
            self.0.lock().contains_key(name)
        }
    }

    struct TestFile {
        objects: SharedObjects,
        name: String,
        properties: Properties,
    }

    impl std::fmt::Display for TestFile {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test://{}", self.name)
        }
    }

    #[async_trait]
    impl PropertiesFile for TestFile {
        fn properties(&self) -> &Properties {
            &self.properties
        }

        fn properties_mut(&mut self) -> &mut Properties {
            &mut self.properties
        }

        async fn exists(&self) -> Result<bool, StorageError> {
            Ok(self.objects.contains(&self.name))
        }

        async fn load(&mut self) -> Result<(), StorageError> {
            let text = self
                .objects
                .0
                .lock()
                .get(&self.name)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(self.name.clone()))?;
            self.properties = Properties::parse(&text).map_err(|e| StorageError::Malformed {
                name: self.name.clone(),
                reason: e.to_string(),
            })?;
            Ok(())
        }

        async fn store(&self) -> Result<(), StorageError> {
            if self.objects.1.load(Ordering::SeqCst) {
                return Err(StorageError::UnexpectedStatus {
                    operation: "PUT",
                    target: self.name.clone(),
                    status: 503,
                });
            }
            self.objects
                .put(&self.name, &self.properties.render(Utc::now()));
            Ok(())
        }

        async fn remove(&self) -> Result<(), StorageError> {
            self.objects
                .0
                .lock()
                .remove(&self.name)
                .map(|_| ())
                .ok_or_else(|| StorageError::NotFound(self.name.clone()))
        }
    }

    struct TestBackend {
        objects: SharedObjects,
        node: String,
    }

    impl TestBackend {
        fn file(&self, name: String) -> TestFile {
            TestFile {
                objects: self.objects.clone(),
                name,
                properties: Properties::new(),
            }
        }
    }

    #[async_trait]
    impl MetricsBackend for TestBackend {
        type File = TestFile;

        fn properties(&self) -> TestFile {
            self.file(own_name(&self.node))
        }

        fn accumulating_metrics(&self) -> AccumulatingBlobStoreMetrics {
            let mut stores = BTreeMap::new();
            stores.insert("test".to_string(), 1000);
            AccumulatingBlobStoreMetrics::new(0, 0, stores, false)
        }

        async fn backing_files(&self) -> Result<BackingFiles<TestFile>, StorageError> {
            let names: Vec<String> = self
                .objects
                .0
                .lock()
                .keys()
                .filter(|name| name.starts_with("metrics/") && name.ends_with(".properties"))
                .cloned()
                .collect();
            let objects = self.objects.clone();
            Ok(Box::new(names.into_iter().map(move |name| TestFile {
                objects: objects.clone(),
                name,
                properties: Properties::new(),
            })))
        }

        async fn remove(&self) -> Result<(), StorageError> {
            let files = self.backing_files().await?;
            for file in files {
                file.remove().await?;
            }
            Ok(())
        }
    }

    fn own_name(node: &str) -> String {
        format!("metrics/{}-metrics.properties", node)
    }

    fn store_for(objects: &SharedObjects, node: &str, settings: MetricsStoreSettings) -> Arc<BlobStoreMetricsStoreSupport<TestBackend>> {
        let backend = TestBackend {
            objects: objects.clone(),
            node: node.to_string(),
        };
        Arc::new(BlobStoreMetricsStoreSupport::new(
            "default",
            backend,
            PeriodicJobService::new(),
            settings,
        ))
    }

    fn slow_settings() -> MetricsStoreSettings {
        MetricsStoreSettings::new(Duration::from_secs(3600), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_start_initializes_missing_file_at_zero() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());

        store.start().await.unwrap();

        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(BLOB_COUNT_PROP_NAME), Some("0"));
        assert_eq!(persisted.get(TOTAL_SIZE_PROP_NAME), Some("0"));
        assert!(store.is_started());
    }

    #[tokio::test]
    async fn test_start_loads_existing_counters() {
        let objects = SharedObjects::default();
        objects.put(&own_name("node-a"), "blobCount=7\ntotalSize=700\n");
        let store = store_for(&objects, "node-a", slow_settings());

        store.start().await.unwrap();

        let local = store.local_metrics();
        assert_eq!(local.blob_count(), 7);
        assert_eq!(local.total_size(), 700);
    }

    #[tokio::test]
    async fn test_start_rejects_malformed_counters() {
        let objects = SharedObjects::default();
        objects.put(&own_name("node-a"), "blobCount=many\n");
        let store = store_for(&objects, "node-a", slow_settings());

        let err = store.start().await.unwrap_err();
        assert!(matches!(
            err,
            MetricsStoreError::Storage(StorageError::Malformed { .. })
        ));
        assert!(!store.is_started());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());

        store.start().await.unwrap();
        let err = store.start().await.unwrap_err();
        assert!(matches!(err, MetricsStoreError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_flush_writes_only_when_dirty() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        store.record_addition(100);
        store.record_addition(50);
        store.record_deletion(100);
        store.flush().await.unwrap();

        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(BLOB_COUNT_PROP_NAME), Some("1"));
        assert_eq!(persisted.get(TOTAL_SIZE_PROP_NAME), Some("50"));

        // Nothing changed since the last flush, so nothing is rewritten
        objects.0.lock().remove(&own_name("node-a"));
        store.flush().await.unwrap();
        assert!(!objects.contains(&own_name("node-a")));
    }

    #[tokio::test]
    async fn test_flush_job_runs_periodically() {
        let objects = SharedObjects::default();
        let settings = MetricsStoreSettings::new(Duration::from_millis(30), Duration::from_secs(3600));
        let store = store_for(&objects, "node-a", settings);
        store.start().await.unwrap();

        store.record_addition(42);
        tokio::time::sleep(Duration::from_millis(150)).await;

        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(TOTAL_SIZE_PROP_NAME), Some("42"));
        store.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_sums_all_nodes() {
        let objects = SharedObjects::default();
        objects.put(&own_name("node-b"), "blobCount=3\ntotalSize=300\n");
        objects.put(&own_name("node-c"), "blobCount=2\ntotalSize=200\n");
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        store.record_addition(10);

        let metrics = store.metrics().await.unwrap();
        assert_eq!(metrics.blob_count(), 6);
        assert_eq!(metrics.total_size(), 510);
        assert_eq!(metrics.available_space(), 1000);
    }

    #[tokio::test]
    async fn test_metrics_before_start_reads_every_file() {
        let objects = SharedObjects::default();
        objects.put(&own_name("node-a"), "blobCount=1\ntotalSize=10\n");
        objects.put(&own_name("node-b"), "blobCount=2\ntotalSize=20\n");
        let store = store_for(&objects, "node-a", slow_settings());

        let metrics = store.metrics().await.unwrap();
        assert_eq!(metrics.blob_count(), 3);
        assert_eq!(metrics.total_size(), 30);
    }

    #[tokio::test]
    async fn test_metrics_skips_unreadable_files() {
        let objects = SharedObjects::default();
        objects.put(&own_name("node-b"), "blobCount=3\ntotalSize=300\n");
        objects.put(&own_name("node-c"), "blobCount=\\u12\n");
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        let metrics = store.metrics().await.unwrap();
        assert_eq!(metrics.blob_count(), 3);
        assert_eq!(metrics.total_size(), 300);
    }

    #[tokio::test]
    async fn test_stop_performs_final_flush() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        store.record_addition(5);
        store.stop().await.unwrap();

        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(BLOB_COUNT_PROP_NAME), Some("1"));
        assert!(!store.is_started());
    }

    #[tokio::test]
    async fn test_failed_flush_stays_dirty() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        store.record_addition(100);
        objects.fail_writes(true);
        let err = store.flush().await.unwrap_err();
        assert!(matches!(err, StorageError::UnexpectedStatus { status: 503, .. }));

        objects.fail_writes(false);
        store.flush().await.unwrap();

        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(BLOB_COUNT_PROP_NAME), Some("1"));
        assert_eq!(persisted.get(TOTAL_SIZE_PROP_NAME), Some("100"));
    }

    #[tokio::test]
    async fn test_failed_stop_can_be_retried() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        store.record_addition(100);
        objects.fail_writes(true);
        assert!(store.stop().await.is_err());
        assert!(store.is_started());

        objects.fail_writes(false);
        store.stop().await.unwrap();
        assert!(!store.is_started());

        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(BLOB_COUNT_PROP_NAME), Some("1"));
        assert_eq!(persisted.get(TOTAL_SIZE_PROP_NAME), Some("100"));
    }

    #[tokio::test]
    async fn test_flush_after_failed_stop_persists() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        store.record_addition(64);
        objects.fail_writes(true);
        assert!(store.stop().await.is_err());

        objects.fail_writes(false);
        store.flush().await.unwrap();

        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(TOTAL_SIZE_PROP_NAME), Some("64"));
    }

    #[tokio::test]
    async fn test_recordings_before_start_are_kept() {
        let objects = SharedObjects::default();
        objects.put(&own_name("node-a"), "blobCount=2\ntotalSize=100\n");
        let store = store_for(&objects, "node-a", slow_settings());

        store.record_addition(10);
        store.start().await.unwrap();

        let local = store.local_metrics();
        assert_eq!(local.blob_count(), 3);
        assert_eq!(local.total_size(), 110);

        store.flush().await.unwrap();
        let persisted = objects.get(&own_name("node-a")).unwrap();
        assert_eq!(persisted.get(BLOB_COUNT_PROP_NAME), Some("3"));
        assert_eq!(persisted.get(TOTAL_SIZE_PROP_NAME), Some("110"));
    }

    #[tokio::test]
    async fn test_stop_without_start_writes_nothing() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());

        store.stop().await.unwrap();
        assert!(!objects.contains(&own_name("node-a")));
    }

    #[tokio::test]
    async fn test_remove_deletes_every_node_file() {
        let objects = SharedObjects::default();
        objects.put(&own_name("node-b"), "blobCount=3\ntotalSize=300\n");
        objects.put("content/vol-01/chap-01/blob.properties", "size=1\n");
        let store = store_for(&objects, "node-a", slow_settings());
        store.start().await.unwrap();

        store.remove().await.unwrap();

        assert!(!objects.contains(&own_name("node-a")));
        assert!(!objects.contains(&own_name("node-b")));
        assert!(objects.contains("content/vol-01/chap-01/blob.properties"));
    }

    #[tokio::test]
    async fn test_check_quota_reports_violation() {
        let objects = SharedObjects::default();
        let mut quota = MockBlobStoreQuotaService::new();
        quota
            .expect_check_quota()
            .withf(|name, metrics| name == "default" && metrics.total_size() == 2048)
            .times(1)
            .returning(|name, _| Some(QuotaResult::new(true, name, "over quota")));

        let backend = TestBackend {
            objects: objects.clone(),
            node: "node-a".to_string(),
        };
        let store = Arc::new(
            BlobStoreMetricsStoreSupport::new("default", backend, PeriodicJobService::new(), slow_settings())
                .with_quota_service(Arc::new(quota)),
        );
        store.start().await.unwrap();
        store.record_addition(2048);

        let result = store.check_quota().await.unwrap().unwrap();
        assert!(result.is_violation());
        assert_eq!(result.blob_store_name(), "default");
    }

    #[tokio::test]
    async fn test_check_quota_without_service() {
        let objects = SharedObjects::default();
        let store = store_for(&objects, "node-a", slow_settings());
        assert!(store.check_quota().await.unwrap().is_none());
    }
}
