//! Benchmarks for task store operations.
//!
//! Every mutation rewrites the whole blob, so cost grows with collection
//! size. These benches track parse, serialize and add across sizes.

// Criterion macros generate items without docs - this is expected for benchmarks
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

use tasklist::services::DEFAULT_STORAGE_KEY;
use tasklist::{MemoryKeyValueStore, Task, TaskCollection, TaskId, TaskStore};

const SIZES: [usize; 4] = [10, 100, 1_000, 5_000];

fn collection_of(size: usize) -> TaskCollection {
    (0..size)
        .map(|i| {
            let created_at = 1_700_000_000_000 + i as u64;
            Task::new(
                TaskId::new(created_at.to_string()),
                format!("task number {i}"),
                created_at,
            )
        })
        .collect()
}

fn bench_blob_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("blob_codec");
    group.measurement_time(Duration::from_secs(5));

    for size in SIZES {
        let collection = collection_of(size);
        let blob = collection.to_json().unwrap();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("parse", size), &blob, |b, blob| {
            b.iter(|| TaskCollection::from_json(black_box(blob)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("serialize", size), &collection, |b, c| {
            b.iter(|| black_box(c).to_json().unwrap());
        });
        group.bench_with_input(BenchmarkId::new("ordered", size), &collection, |b, c| {
            b.iter(|| black_box(c).ordered().len());
        });
    }

    group.finish();
}

fn bench_add_task(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_task");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    for size in SIZES {
        let blob = collection_of(size).to_json().unwrap();
        let store = TaskStore::new(MemoryKeyValueStore::with_value(DEFAULT_STORAGE_KEY, blob));
        runtime.block_on(store.load()).unwrap();

        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let task = store.add_task(black_box("bench")).await.unwrap();
                    store.delete_task(&task.id).await.unwrap();
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_blob_codec, bench_add_task);
criterion_main!(benches);
