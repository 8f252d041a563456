/// Properties codec benchmarks
/// Measures parse/render of attribute and metrics files and the metrics flush path
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use swift_blobstore::application::metrics::{BlobStoreMetricsStoreSupport, MetricsStoreSettings};
use swift_blobstore::application::scheduler::PeriodicJobService;
use swift_blobstore::domain::entities::{BlobAttributes, BlobMetrics};
use swift_blobstore::domain::value_objects::{BlobId, NodeId, Properties};
use swift_blobstore::infrastructure::{
    BlobPathBuilder, InMemoryObjectStorage, SwiftBlobStoreMetricsStore,
};
use tokio::runtime::Runtime;

fn sample_properties(headers: usize) -> Properties {
    let mut custom = BTreeMap::new();
    for i in 0..headers {
        custom.insert(
            format!("BlobStore.header-{}", i),
            format!("org/acme/component-{}/1.0.{}/artifact with spaces=and:separators.jar", i, i),
        );
    }
    let attributes = BlobAttributes::new(
        custom,
        BlobMetrics::new(
            Utc.with_ymd_and_hms(2024, 5, 17, 9, 15, 30).unwrap(),
            "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12".parse().unwrap(),
            4096,
        ),
    );
    let mut properties = Properties::new();
    attributes.write_to(&mut properties);
    properties
}

fn codec_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("properties_codec");
    group.measurement_time(Duration::from_secs(5));

    for headers in [4, 32, 256] {
        let properties = sample_properties(headers);
        let text = properties.render(Utc::now());
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::new("render", headers), &properties, |b, p| {
            b.iter(|| p.render(Utc::now()))
        });

        group.bench_with_input(BenchmarkId::new("parse", headers), &text, |b, t| {
            b.iter(|| Properties::parse(t).unwrap())
        });

        // Full attribute decode including typed field validation
        group.bench_with_input(BenchmarkId::new("read_attributes", headers), &text, |b, t| {
            b.iter(|| BlobAttributes::read_from(&Properties::parse(t).unwrap()).unwrap())
        });
    }

    group.finish();
}

fn path_benchmarks(c: &mut Criterion) {
    let builder = BlobPathBuilder::default();
    let ids: Vec<BlobId> = (0..1024).map(|_| BlobId::new()).collect();

    c.bench_function("attributes_path", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % ids.len();
            builder.attributes_path(&ids[i])
        })
    });
}

fn flush_benchmarks(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let storage = Arc::new(InMemoryObjectStorage::with_container("blobs"));
    let backend = SwiftBlobStoreMetricsStore::builder()
        .node_id(NodeId::new("bench-node").unwrap())
        .unwrap()
        .container("blobs")
        .unwrap()
        .storage(storage)
        .unwrap()
        .build()
        .unwrap();
    let store = Arc::new(BlobStoreMetricsStoreSupport::new(
        "bench",
        backend,
        PeriodicJobService::new(),
        MetricsStoreSettings::new(Duration::from_secs(3600), Duration::from_secs(3600)),
    ));
    rt.block_on(store.start()).unwrap();

    c.bench_function("metrics_flush", |b| {
        b.to_async(&rt).iter(|| {
            let store = Arc::clone(&store);
            async move {
                store.record_addition(1024);
                store.flush().await.unwrap();
            }
        })
    });
}

criterion_group!(benches, codec_benchmarks, path_benchmarks, flush_benchmarks);
criterion_main!(benches);
