use criterion::{BenchmarkId, Criterion};
use orderdesk::ShardedTtlCache;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const TTL: Duration = Duration::from_secs(60);
const KEY_COUNT: u64 = 1_000;

/// Register benchmarks that compare shard counts and read/write mixes
pub fn register_contention_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("ShardedTtlCache - Contention Patterns");

    for shard_count in [1, 4, 16, 64].iter() {
        let thread_count = 8;

        group.bench_with_input(
            BenchmarkId::new("shard_count", shard_count),
            shard_count,
            |b, &shard_count| {
                b.iter_custom(|iters| measure_contention(shard_count, thread_count, iters, 50));
            },
        );
    }

    for read_ratio in [0, 50, 95].iter() {
        let thread_count = 8;

        group.bench_with_input(
            BenchmarkId::new("read_write_ratio", read_ratio),
            read_ratio,
            |b, &read_ratio| {
                b.iter_custom(|iters| measure_contention(64, thread_count, iters, read_ratio));
            },
        );
    }

    group.finish();
}

/// Measures time for `iterations` operations per thread, `read_ratio` percent
/// of them reads
fn measure_contention(
    shard_count: usize,
    thread_count: usize,
    iterations: u64,
    read_ratio: u64,
) -> Duration {
    let cache = Arc::new(ShardedTtlCache::new(shard_count, TTL));
    for i in 0..KEY_COUNT {
        cache.insert(format!("orders:customer:{}:last10", i), i);
    }
    let keys: Arc<Vec<String>> = Arc::new(
        (0..KEY_COUNT)
            .map(|i| format!("orders:customer:{}:last10", i))
            .collect(),
    );
    let barrier = Arc::new(Barrier::new(thread_count + 1));

    let mut handles = Vec::with_capacity(thread_count);
    for thread_id in 0..thread_count {
        let cache = Arc::clone(&cache);
        let keys = Arc::clone(&keys);
        let barrier = Arc::clone(&barrier);

        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..iterations {
                let index = (i * 31 + thread_id as u64 * 7919) % KEY_COUNT;
                let key = &keys[index as usize];
                if i % 100 < read_ratio {
                    let _ = cache.get(key);
                } else {
                    cache.set(key.as_str(), i, TTL);
                }
            }
            barrier.wait();
        }));
    }

    barrier.wait();
    let start = Instant::now();
    barrier.wait();
    let duration = start.elapsed();

    for handle in handles {
        let _ = handle.join();
    }

    duration
}
