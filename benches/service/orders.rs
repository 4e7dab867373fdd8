use criterion::{BenchmarkId, Criterion};
use orderdesk::ledger::{CustomerId, ItemId, MemoryStore, NewItem};
use orderdesk::{OrderService, ServiceConfig};
use rust_decimal::Decimal;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("OrderService - Place Order");

    group.bench_function("place_order_with_cached_history", |b| {
        let (service, items, customers) = setup(1);
        service.get_order_history(customers[0]).unwrap();
        b.iter(|| service.place_order(items[0], 1, customers[0]).unwrap())
    });

    // Same item for every thread versus one item per thread.
    for thread_count in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("concurrent_same_item", thread_count),
            thread_count,
            |b, &thread_count| {
                b.iter_custom(|iters| measure_concurrent_orders(thread_count, iters, false));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("concurrent_distinct_items", thread_count),
            thread_count,
            |b, &thread_count| {
                b.iter_custom(|iters| measure_concurrent_orders(thread_count, iters, true));
            },
        );
    }

    group.finish();
}

fn setup(count: usize) -> (OrderService<MemoryStore>, Vec<ItemId>, Vec<CustomerId>) {
    let store = MemoryStore::new();
    let customers = (0..count)
        .map(|i| store.register_customer(&format!("Bench {}", i), "1 Bench St", "555-0000"))
        .collect();
    let service = OrderService::new(store, ServiceConfig::default());
    let items = (0..count)
        .map(|i| {
            service
                .add_item(NewItem::new(
                    &format!("Record {}", i),
                    "Bench Artist",
                    Decimal::new(1000, 2),
                    u32::MAX,
                ))
                .unwrap()
        })
        .collect();
    (service, items, customers)
}

/// Measures time for concurrent order placement, all threads on one item or
/// each on its own
fn measure_concurrent_orders(thread_count: usize, iterations: u64, distinct: bool) -> Duration {
    let (service, items, customers) = setup(thread_count);
    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(thread_count + 1));

    let mut handles = Vec::with_capacity(thread_count);
    for thread_id in 0..thread_count {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let item = if distinct { items[thread_id] } else { items[0] };
        let customer = customers[thread_id];

        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..iterations {
                let _ = service.place_order(item, 1, customer);
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
