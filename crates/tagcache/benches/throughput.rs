//! Benchmarks for tagcache throughput and operations

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use tagcache::{Cache, MemoryBackend, MemoryConfig, TagCache, TagCacheConfig};
use tokio::runtime::Runtime;

fn create_cache() -> TagCache<MemoryBackend> {
    let backend = MemoryBackend::new(MemoryConfig::without_sweeper());
    TagCache::with_config(backend, TagCacheConfig::no_expiry())
}

fn bench_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = create_cache();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("untagged", |b| {
        b.iter(|| {
            rt.block_on(async {
                cache.set(black_box("key"), black_box(&42i32), &[]).await.unwrap();
            });
        });
    });

    group.bench_function("three_tags", |b| {
        b.iter(|| {
            rt.block_on(async {
                cache
                    .set(black_box("key"), black_box(&42i32), &["a", "b", "c"])
                    .await
                    .unwrap();
            });
        });
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = create_cache();

    // Pre-populate
    rt.block_on(async {
        cache.set("key", &42i32, &["t"]).await.unwrap();
    });

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result: i32 = cache.get(black_box("key")).await.unwrap();
                black_box(result);
            });
        });
    });

    group.bench_function("miss", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = cache.get::<i32>(black_box("nonexistent")).await;
                black_box(result.is_err());
            });
        });
    });

    group.finish();
}

fn bench_invalidate_tag(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = create_cache();

    let mut group = c.benchmark_group("invalidate");
    group.throughput(Throughput::Elements(100));

    group.bench_function("tag_of_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                for i in 0..100 {
                    cache.set(&format!("key:{}", i), &i, &["bulk"]).await.unwrap();
                }
                cache.del_by_tag(black_box("bulk")).await.unwrap();
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_invalidate_tag);
criterion_main!(benches);
