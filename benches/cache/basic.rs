use criterion::Criterion;
use orderdesk::ShardedTtlCache;
use std::hint::black_box;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

pub fn benchmark_cache_basics(c: &mut Criterion) {
    let mut group = c.benchmark_group("ShardedTtlCache - Basic Operations");

    group.bench_function("create_cache_64_shards", |b| {
        b.iter(|| {
            let _cache: ShardedTtlCache<u64> = ShardedTtlCache::new(64, TTL);
        })
    });

    let cache = ShardedTtlCache::new(64, TTL);
    for i in 0..1_000u64 {
        cache.insert(format!("orders:customer:{}:last10", i), i);
    }

    group.bench_function("get_hit", |b| {
        b.iter(|| black_box(cache.get("orders:customer:500:last10")))
    });

    group.bench_function("get_miss", |b| {
        b.iter(|| black_box(cache.get("orders:customer:5000:last10")))
    });

    group.bench_function("set_existing", |b| {
        b.iter(|| cache.set("orders:customer:7:last10", black_box(7), TTL))
    });

    group.bench_function("update_existing", |b| {
        b.iter(|| cache.update("orders:customer:9:last10", TTL, |value| Some(value + 1)))
    });

    group.bench_function("purge_expired_1000_live", |b| {
        b.iter(|| black_box(cache.purge_expired()))
    });

    group.finish();
}
