//! Expiring cache benchmarks
//!
//! Benchmarks for insert, lookup, insert-if-absent, sweeps, caller-managed
//! critical sections, and concurrent access patterns.
//!
//! Run with: `cargo bench --bench cache_bench -p utilkit-common`

use std::sync::Arc;
use std::time::Duration;

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use utilkit_common::cache::{CacheConfig, ExpiringCache};
use utilkit_common::time::MockClock;

/// Long enough that the sweeper never fires inside a measurement.
const BENCH_TTL: Duration = Duration::from_secs(3600);

fn populated(size: u64) -> ExpiringCache<u64, String> {
    let cache = ExpiringCache::new(BENCH_TTL).unwrap();
    for i in 0..size {
        cache.insert(i, format!("value_{}", i));
    }
    cache
}

// ============================================================================
// Basic Operations Benchmarks
// ============================================================================

fn bench_cache_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_insert");

    for size in [100u64, 1000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("overwrite", size), &size, |b, &size| {
            let cache = populated(size);
            let mut counter = 0u64;
            b.iter(|| {
                let key = counter % size;
                cache.insert(black_box(key), black_box(format!("value_{}", counter)));
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_cache_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_get_hit");

    for size in [100u64, 1000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("get", size), &size, |b, &size| {
            let cache = populated(size);
            let mut counter = 0u64;
            b.iter(|| {
                let key = counter % size;
                let _ = black_box(cache.get(&black_box(key)));
                counter = counter.wrapping_add(1);
            });
        });
        group.bench_with_input(BenchmarkId::new("get_with", size), &size, |b, &size| {
            let cache = populated(size);
            let mut counter = 0u64;
            b.iter(|| {
                let key = counter % size;
                let _ = black_box(cache.get_with(&black_box(key), String::len));
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_cache_get_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_get_miss");

    group.throughput(Throughput::Elements(1));
    group.bench_function("get", |b| {
        let cache = populated(1000);
        let mut counter = 1000u64;
        b.iter(|| {
            let _ = black_box(cache.get(&black_box(counter)));
            counter = counter.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_get_or_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_get_or_insert");

    group.throughput(Throughput::Elements(1));
    group.bench_function("hit", |b| {
        let cache = populated(1000);
        let mut counter = 0u64;
        b.iter(|| {
            let key = counter % 1000;
            let _ = black_box(cache.get_or_insert_with(black_box(key), || unreachable!()));
            counter = counter.wrapping_add(1);
        });
    });

    group.bench_function("miss", |b| {
        let cache: ExpiringCache<u64, String> = ExpiringCache::new(BENCH_TTL).unwrap();
        let mut counter = 0u64;
        b.iter(|| {
            let _ = black_box(
                cache.get_or_insert_with(black_box(counter), || format!("value_{}", counter)),
            );
            counter = counter.wrapping_add(1);
        });
    });

    group.finish();
}

// ============================================================================
// Sweep Benchmarks
// ============================================================================

fn bench_purge_expired(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_purge_expired");

    for size in [1000u64, 10_000] {
        group.throughput(Throughput::Elements(size));

        // Half the entries are past their ttl when the sweep runs.
        group.bench_with_input(BenchmarkId::new("half_expired", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let clock = MockClock::new();
                    let cache = ExpiringCache::with_clock(CacheConfig::ttl(BENCH_TTL), clock.clone())
                        .unwrap();
                    for i in 0..size / 2 {
                        cache.insert(i, i);
                    }
                    clock.advance(BENCH_TTL / 2);
                    for i in size / 2..size {
                        cache.insert(i, i);
                    }
                    clock.advance(BENCH_TTL / 2 + Duration::from_secs(1));
                    cache
                },
                |cache| black_box(cache.purge_expired()),
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("none_expired", size), &size, |b, &size| {
            let cache = populated(size);
            b.iter(|| black_box(cache.purge_expired()));
        });
    }

    group.finish();
}

// ============================================================================
// Metrics Benchmarks
// ============================================================================

fn bench_cache_with_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_metrics");

    for track_metrics in [false, true] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("get", track_metrics),
            &track_metrics,
            |b, &track_metrics| {
                let config =
                    CacheConfig::builder().ttl(BENCH_TTL).track_metrics(track_metrics).build();
                let cache: ExpiringCache<u64, u64> = ExpiringCache::with_config(config).unwrap();
                for i in 0..1000u64 {
                    cache.insert(i, i);
                }
                let mut counter = 0u64;
                b.iter(|| {
                    let _ = black_box(cache.get(&black_box(counter % 2000)));
                    counter = counter.wrapping_add(1);
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Concurrent Access Benchmarks
// ============================================================================

fn bench_cache_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_concurrent_reads");

    for thread_count in [2u64, 4, 8] {
        group.throughput(Throughput::Elements(thread_count * 100));
        group.bench_with_input(
            BenchmarkId::new("threads", thread_count),
            &thread_count,
            |b, &thread_count| {
                let cache = populated(1000);

                b.iter(|| {
                    let mut handles = vec![];
                    for _ in 0..thread_count {
                        let cache_clone = cache.clone();
                        let handle = std::thread::spawn(move || {
                            for i in 0..100u64 {
                                let _ = black_box(cache_clone.get(&black_box(i)));
                            }
                        });
                        handles.push(handle);
                    }
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_cache_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_concurrent_mixed");

    for thread_count in [2u64, 4, 8] {
        group.throughput(Throughput::Elements(thread_count * 100));
        group.bench_with_input(
            BenchmarkId::new("threads", thread_count),
            &thread_count,
            |b, &thread_count| {
                let cache = populated(1000);

                b.iter(|| {
                    let mut handles = vec![];
                    for t in 0..thread_count {
                        let cache_clone = cache.clone();
                        let handle = std::thread::spawn(move || {
                            for i in 0..100u64 {
                                let key = (t * 100) + i;
                                cache_clone.insert(key, format!("value_{}", key));
                                let _ = black_box(cache_clone.get(&black_box(key)));
                            }
                        });
                        handles.push(handle);
                    }
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_lock_guard(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_lock_guard");

    group.throughput(Throughput::Elements(1));
    group.bench_function("read_modify_write", |b| {
        let cache: ExpiringCache<&'static str, u64> = ExpiringCache::new(BENCH_TTL).unwrap();
        b.iter(|| {
            let mut guard = cache.lock();
            let current = guard.get("counter").copied().unwrap_or(0);
            guard.insert("counter", black_box(current + 1));
        });
    });

    group.finish();
}

// ============================================================================
// Real-World Scenario Benchmarks
// ============================================================================

fn bench_session_store_scenario(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_world_session_store");

    // Simulates user session storage with 30min TTL
    group.throughput(Throughput::Elements(1));
    group.bench_function("session_access", |b| {
        let cache: ExpiringCache<String, Arc<serde_json::Value>> =
            ExpiringCache::new(Duration::from_secs(1800)).unwrap();

        // Pre-populate with active sessions
        for i in 0..5000 {
            let session = Arc::new(serde_json::json!({
                "user_id": i,
                "authenticated_at": "2024-01-01T00:00:00Z",
                "permissions": ["read", "write"]
            }));
            cache.insert(format!("session_{}", i), session);
        }

        let mut counter = 0u64;
        b.iter(|| {
            let key = format!("session_{}", counter % 5000);
            let _ = black_box(cache.get(black_box(key.as_str())));
            counter = counter.wrapping_add(1);
        });
    });

    group.finish();
}

criterion_group!(
    basic_operations,
    bench_cache_insert,
    bench_cache_get_hit,
    bench_cache_get_miss,
    bench_get_or_insert,
);

criterion_group!(sweeps, bench_purge_expired,);

criterion_group!(metrics, bench_cache_with_metrics,);

criterion_group!(concurrent, bench_cache_concurrent_reads, bench_cache_concurrent_mixed, bench_lock_guard,);

criterion_group!(real_world, bench_session_store_scenario,);

criterion_main!(basic_operations, sweeps, metrics, concurrent, real_world);
