use criterion::Criterion;
use orderdesk::ledger::{MemoryStore, NewItem};
use orderdesk::{OrderService, ServiceConfig};
use rust_decimal::Decimal;
use std::hint::black_box;

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("OrderService - History Reads");

    let store = MemoryStore::new();
    let customer = store.register_customer("Bench", "1 Bench St", "555-0000");
    let service = OrderService::new(store, ServiceConfig::default());
    let item = service
        .add_item(NewItem::new("Bench Record", "Bench Artist", Decimal::new(1000, 2), 1_000_000))
        .unwrap();
    for _ in 0..10 {
        service.place_order(item, 1, customer).unwrap();
    }
    service.get_order_history(customer).unwrap();

    group.bench_function("cached_history", |b| {
        b.iter(|| black_box(service.get_order_history(customer).unwrap()))
    });

    group.bench_function("uncached_history", |b| {
        b.iter(|| {
            service.cache().delete(&service.history_key(customer));
            black_box(service.get_order_history(customer).unwrap())
        })
    });

    group.finish();
}
