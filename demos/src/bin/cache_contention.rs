use orderdesk::cache::ShardedTtlCache;
use orderdesk::setup_logger;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const THREAD_COUNT: usize = 8;
const TEST_DURATION_MS: u64 = 1500;
const KEY_COUNT: usize = 1_000;
const TTL: Duration = Duration::from_secs(30);

fn main() {
    setup_logger();
    info!("Sharded Cache Contention Test");
    info!("=============================");
    info!("Threads: {}", THREAD_COUNT);
    info!("Test duration: {} ms per case", TEST_DURATION_MS);

    test_shard_count();
    test_read_write_ratio();
}

// Same workload, different shard counts.
fn test_shard_count() {
    info!("\n[TEST] Shard Count");
    info!("------------------");

    let mut results = HashMap::new();
    for shards in [1, 4, 16, 64] {
        let ops = run_case(shards, 50);
        info!("{} shards: {:.0} ops/s", shards, ops);
        results.insert(shards, ops);
    }

    if let (Some(one), Some(many)) = (results.get(&1), results.get(&64)) {
        info!("Speed-up from 1 to 64 shards: {:.2}x", many / one.max(1.0));
    }
}

fn test_read_write_ratio() {
    info!("\n[TEST] Read/Write Ratio");
    info!("-----------------------");

    for read_percentage in [0, 50, 95] {
        let ops = run_case(64, read_percentage);
        info!("{}% reads: {:.0} ops/s", read_percentage, ops);
    }
}

fn run_case(shards: usize, read_percentage: usize) -> f64 {
    let cache = Arc::new(ShardedTtlCache::new(shards, TTL));
    for i in 0..KEY_COUNT {
        cache.insert(format!("orders:customer:{}:last10", i), i);
    }

    let running = Arc::new(AtomicBool::new(true));
    let barrier = Arc::new(Barrier::new(THREAD_COUNT + 1));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            let running = Arc::clone(&running);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ops = 0u64;
                let mut i = thread_id * 7919;
                while running.load(Ordering::Relaxed) {
                    let key = format!("orders:customer:{}:last10", i % KEY_COUNT);
                    if i % 100 < read_percentage {
                        let _ = cache.get(&key);
                    } else {
                        cache.set(key, i, TTL);
                    }
                    ops += 1;
                    i = i.wrapping_add(31);
                }
                ops
            })
        })
        .collect();

    let started = Instant::now();
    barrier.wait();
    thread::sleep(Duration::from_millis(TEST_DURATION_MS));
    running.store(false, Ordering::Relaxed);

    let total: u64 = handles
        .into_iter()
        .filter_map(|handle| handle.join().ok())
        .sum();
    total as f64 / started.elapsed().as_secs_f64()
}
