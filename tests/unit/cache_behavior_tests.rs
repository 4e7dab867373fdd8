//! Cache transparency, staleness and shard independence seen from outside.

#[cfg(test)]
mod tests {
    use orderdesk::ledger::{MemoryStore, NewItem};
    use orderdesk::service::{OrderService, ServiceConfig};
    use orderdesk::ShardedTtlCache;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_history_served_from_cache_within_ttl() {
        let store = MemoryStore::new();
        let customer = store.register_customer("Billie", "8 Oak St", "555-0108");
        let service = OrderService::new(store, ServiceConfig::default());
        let item = service
            .add_item(NewItem::new("Lady in Satin", "Billie Holiday", Decimal::new(1800, 2), 9))
            .unwrap();
        service.place_order(item, 2, customer).unwrap();

        let reads: Vec<_> = (0..10)
            .map(|_| service.get_order_history(customer).unwrap())
            .collect();

        assert!(reads.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(service.ledger().store().history_reads(), 1);
    }

    #[test]
    fn test_ledger_read_after_ttl() {
        let store = MemoryStore::new();
        let customer = store.register_customer("Chet", "9 Pine St", "555-0109");
        let service = OrderService::new(
            store,
            ServiceConfig::default().with_entry_ttl(Duration::from_millis(25)),
        );

        service.get_order_history(customer).unwrap();
        thread::sleep(Duration::from_millis(50));
        service.get_order_history(customer).unwrap();

        assert_eq!(service.ledger().store().history_reads(), 2);
        assert!(service.stats().cache.lazy_evictions >= 1);
    }

    #[test]
    fn test_locked_shard_does_not_block_other_shards() {
        let cache = Arc::new(ShardedTtlCache::new(16, Duration::from_secs(60)));
        let hot = "orders:customer:1:last10".to_string();
        let hot_shard = cache.shard_index(&hot);
        let cold = (2..1_000)
            .map(|i| format!("orders:customer:{i}:last10"))
            .find(|key| cache.shard_index(key) != hot_shard)
            .unwrap();
        cache.insert(cold.clone(), 1u32);

        let (locked_tx, locked_rx) = mpsc::channel();
        let holder = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache.with_shard_locked(&hot, || {
                    locked_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(300));
                });
            })
        };
        locked_rx.recv().unwrap();

        let started = Instant::now();
        assert_eq!(cache.get(&cold), Some(1));
        cache.set(cold.clone(), 2, Duration::from_secs(60));
        assert!(cache.delete(&cold));
        assert!(started.elapsed() < Duration::from_millis(150));

        holder.join().unwrap();
    }

    #[test]
    fn test_shard_assignment_stable() {
        let cache: ShardedTtlCache<u8> = ShardedTtlCache::new(64, Duration::from_secs(60));
        let key = "orders:customer:42:last10";
        let shard = cache.shard_index(key);

        cache.insert(key, 1);
        cache.delete(key);
        cache.purge_expired();

        assert_eq!(cache.shard_index(key), shard);
        assert!(shard < cache.shard_count());
    }
}
