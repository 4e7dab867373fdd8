use orderdesk::ledger::{CustomerId, ItemId, LedgerError, MemoryStore, NewItem};
use orderdesk::service::{OrderService, ServiceConfig, ServiceError};
use orderdesk::setup_logger;
use orderdesk::sync::BoundedTaskPool;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const ITEM_COUNT: usize = 5;
const UNITS_PER_ITEM: u32 = 100;
const CUSTOMER_COUNT: usize = 20;
const ORDER_COUNT: usize = 600;
const WORKERS: usize = 8;
const QUEUE_CAPACITY: usize = 32;

#[derive(Debug)]
enum Outcome {
    Placed,
    SoldOut,
    Failed(ServiceError),
    HistoryRead(usize),
}

fn main() {
    setup_logger();
    info!("Bulk Order Simulation");
    info!("---------------------");
    info!("Items: {} x {} units", ITEM_COUNT, UNITS_PER_ITEM);
    info!("Customers: {}", CUSTOMER_COUNT);
    info!("Orders: {} over {} workers", ORDER_COUNT, WORKERS);

    let config = ServiceConfig::default()
        .with_pool(WORKERS, QUEUE_CAPACITY)
        .with_entry_ttl(Duration::from_millis(200))
        .with_sweep_interval(Duration::from_millis(50));

    let (service, items, customers) = setup(config);
    let service = Arc::new(service);
    if let Err(err) = service.start_maintenance() {
        warn!("Could not start cache maintenance: {}", err);
    }

    match run_simulation(&service, &items, &customers) {
        Ok(outcomes) => report(&service, &items, &outcomes),
        Err(err) => error!("Simulation aborted: {}", err),
    }
}

fn setup(config: ServiceConfig) -> (OrderService<MemoryStore>, Vec<ItemId>, Vec<CustomerId>) {
    let store = MemoryStore::new();
    let customers = (0..CUSTOMER_COUNT)
        .map(|i| {
            store.register_customer(
                &format!("Customer {}", i),
                &format!("{} Market St", 100 + i),
                &format!("555-{:04}", i),
            )
        })
        .collect();

    let service = OrderService::new(store, config);
    let items = (0..ITEM_COUNT)
        .filter_map(|i| {
            let item = NewItem::new(
                &format!("Record {}", i),
                &format!("Artist {}", i % 2),
                Decimal::new(1999 + i as i64 * 100, 2),
                UNITS_PER_ITEM,
            );
            match service.add_item(item) {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!("Could not add item {}: {}", i, err);
                    None
                }
            }
        })
        .collect();

    (service, items, customers)
}

fn run_simulation(
    service: &Arc<OrderService<MemoryStore>>,
    items: &[ItemId],
    customers: &[CustomerId],
) -> Result<Vec<Outcome>, ServiceError> {
    let pool = BoundedTaskPool::with_name("simulation", WORKERS, QUEUE_CAPACITY)?;
    let started = Instant::now();

    for i in 0..ORDER_COUNT {
        let service = Arc::clone(service);
        let customer = customers[i % customers.len()];
        if i % 5 == 4 {
            let deadline = service.config().ledger_timeout();
            pool.submit(move || match service.get_order_history_within(customer, deadline) {
                Ok(history) => Outcome::HistoryRead(history.len()),
                Err(err) => Outcome::Failed(err),
            })?;
            continue;
        }

        let item = items[i % items.len()];
        let quantity = 1 + (i % 3) as u32;
        pool.submit(move || match service.place_order(item, quantity, customer) {
            Ok(_) => Outcome::Placed,
            Err(ServiceError::Ledger(LedgerError::InsufficientInventory { .. })) => {
                Outcome::SoldOut
            }
            Err(err) => Outcome::Failed(err),
        })?;
    }

    let outcomes = pool.drain()?;
    info!("Simulation completed in {:?}", started.elapsed());
    Ok(outcomes)
}

fn report(service: &OrderService<MemoryStore>, items: &[ItemId], outcomes: &[Outcome]) {
    let placed = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Placed))
        .count();
    let sold_out = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::SoldOut))
        .count();
    let (reads, orders_seen) = outcomes.iter().fold((0, 0), |(reads, seen), o| match o {
        Outcome::HistoryRead(len) => (reads + 1, seen + len),
        _ => (reads, seen),
    });
    let failed: Vec<_> = outcomes
        .iter()
        .filter_map(|o| match o {
            Outcome::Failed(err) => Some(err),
            _ => None,
        })
        .collect();

    info!("\nOutcomes:");
    info!("Orders placed: {}", placed);
    info!("Orders rejected for stock: {}", sold_out);
    info!("History reads: {} ({} orders returned)", reads, orders_seen);
    info!("Other failures: {}", failed.len());
    for err in failed.iter().take(5) {
        warn!("  {}", err);
    }

    let orders = service.ledger().store().all_orders();
    let ordered_units: u64 = orders.iter().map(|o| u64::from(o.quantity)).sum();
    let remaining_units: u64 = items
        .iter()
        .filter_map(|&id| service.item(id).ok())
        .map(|item| u64::from(item.quantity))
        .sum();
    let initial_units = items.len() as u64 * u64::from(UNITS_PER_ITEM);

    info!("\nConsistency:");
    info!("Initial units: {}", initial_units);
    info!("Ordered units: {}", ordered_units);
    info!("Remaining units: {}", remaining_units);
    if ordered_units + remaining_units == initial_units && orders.len() == placed {
        info!("Inventory and orders agree");
    } else {
        error!(
            "Mismatch: {} orders recorded for {} successful placements",
            orders.len(),
            placed
        );
    }

    match serde_json::to_string_pretty(&service.stats()) {
        Ok(stats) => info!("\nService stats:\n{}", stats),
        Err(err) => warn!("Could not render stats: {}", err),
    }
}
