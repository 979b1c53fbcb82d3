//! Cache and rate limiter throughput, against a plain locked HashMap.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tempokv::{CacheConfig, RateLimiter, TtlCache};

fn generate_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("session:{:08}", i)).collect()
}

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");

    for size in [1_000, 10_000, 100_000].iter() {
        let keys = generate_keys(*size);

        group.bench_with_input(BenchmarkId::new("RwLock<HashMap>", size), size, |b, _| {
            b.iter(|| {
                let map: RwLock<HashMap<String, u64>> = RwLock::new(HashMap::new());
                for (i, key) in keys.iter().enumerate() {
                    map.write().insert(key.clone(), i as u64);
                }
                black_box(map)
            });
        });

        group.bench_with_input(BenchmarkId::new("TtlCache", size), size, |b, _| {
            b.iter(|| {
                let cache = TtlCache::new(CacheConfig::default()).unwrap();
                for (i, key) in keys.iter().enumerate() {
                    cache.set(key.clone(), i as u64).unwrap();
                }
                black_box(cache)
            });
        });

        group.bench_with_input(BenchmarkId::new("TtlCache/bounded", size), size, |b, _| {
            b.iter(|| {
                let cache = TtlCache::new(CacheConfig::default().with_capacity(size / 10)).unwrap();
                for (i, key) in keys.iter().enumerate() {
                    cache.set(key.clone(), i as u64).unwrap();
                }
                black_box(cache)
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for size in [1_000, 10_000, 100_000].iter() {
        let keys = generate_keys(*size);

        let map: RwLock<HashMap<String, u64>> = RwLock::new(HashMap::new());
        let cache = TtlCache::new(CacheConfig::default()).unwrap();
        for (i, key) in keys.iter().enumerate() {
            map.write().insert(key.clone(), i as u64);
            cache.set(key.clone(), i as u64).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("RwLock<HashMap>", size), size, |b, _| {
            b.iter(|| {
                for key in &keys {
                    black_box(map.read().get(key.as_str()).copied());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("TtlCache", size), size, |b, _| {
            b.iter(|| {
                for key in &keys {
                    black_box(cache.get(key.as_str()));
                }
            });
        });
    }

    group.finish();
}

fn bench_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("limiter");
    let window = Duration::from_secs(3_600);

    for clients in [10, 1_000, 100_000].iter() {
        let keys = generate_keys(*clients);
        let limiter: RateLimiter<String> = RateLimiter::new();

        group.bench_with_input(BenchmarkId::new("allow", clients), clients, |b, _| {
            b.iter(|| {
                for key in &keys {
                    black_box(limiter.allow(key, u32::MAX, window).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_limiter);
criterion_main!(benches);
