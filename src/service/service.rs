use super::config::ServiceConfig;
use super::error::ServiceError;
use super::history::{HistoryBytes, HistoryCache};
use crate::cache::{CacheStatsSnapshot, CacheSweeper, ShardedTtlCache};
use crate::ledger::{
    Customer, CustomerId, InventoryItem, ItemId, LedgerError, NewItem, Order, OrderId,
    OrderLedger, TransactionalStore,
};
use crate::sync::{AtomicCounter, BoundedTaskPool, CancellableOperation, SingleInitGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// State shared with background work.
struct Shared<S> {
    ledger: OrderLedger<S>,
    history: HistoryCache,
    ledger_reads: AtomicCounter,
    orders_placed: AtomicCounter,
    orders_rejected: AtomicCounter,
}

impl<S: TransactionalStore> Shared<S> {
    fn load_history(&self, customer: CustomerId) -> Result<Vec<Order>, LedgerError> {
        self.ledger_reads.incr();
        self.ledger.recent_orders(customer, self.history.window())
    }

    /// Loads a history into the cache unless it is already there.
    /// Returns whether the ledger was read.
    fn warm(&self, customer: CustomerId) -> bool {
        if self.history.lookup(customer).is_some() {
            return false;
        }
        match self.load_history(customer) {
            Ok(orders) => {
                self.history.fill(customer, &orders);
                true
            }
            Err(err) => {
                warn!("service: could not warm history of customer {}: {}", customer, err);
                false
            }
        }
    }
}

/// Front door of the crate: serves order history through the cache and
/// routes writes through the ledger, keeping the two consistent.
///
/// Reads try the cache first and fall back to the ledger, populating the
/// cache on the way out. Writes go to the ledger and then patch or invalidate
/// the customer's cached history. Cache trouble never fails a call.
///
/// # Examples
///
/// ```
/// use orderdesk::ledger::{MemoryStore, NewItem};
/// use orderdesk::service::{OrderService, ServiceConfig};
/// use rust_decimal::Decimal;
///
/// let store = MemoryStore::new();
/// let customer = store.register_customer("Ada", "1 Loop Rd", "555-0100");
/// let service = OrderService::new(store, ServiceConfig::default());
/// let item = service
///     .add_item(NewItem::new("Blue Train", "John Coltrane", Decimal::new(5699, 2), 5))
///     .unwrap();
///
/// assert!(service.check_availability(item, 2).unwrap());
/// let order = service.place_order(item, 2, customer).unwrap();
/// assert_eq!(service.get_order_history(customer).unwrap()[0].id, order);
/// ```
pub struct OrderService<S> {
    shared: Arc<Shared<S>>,
    config: ServiceConfig,
    sweeper: SingleInitGuard<CacheSweeper>,
}

impl<S: TransactionalStore + 'static> OrderService<S> {
    /// Builds a service over `store` with a fresh cache sized by `config`.
    pub fn new(store: S, config: ServiceConfig) -> Self {
        let cache = Arc::new(ShardedTtlCache::from_config(&config.cache));
        Self::with_cache(store, config, cache)
    }

    /// Builds a service over `store` that keeps histories in `cache`.
    pub fn with_cache(
        store: S,
        config: ServiceConfig,
        cache: Arc<ShardedTtlCache<HistoryBytes>>,
    ) -> Self {
        let history = HistoryCache::new(cache, config.history_window, config.cache.entry_ttl());
        info!(
            "service: ready with {} shards, ttl {:?}, history window {}",
            history.cache().shard_count(),
            config.cache.entry_ttl(),
            config.history_window
        );
        Self {
            shared: Arc::new(Shared {
                ledger: OrderLedger::new(store),
                history,
                ledger_reads: AtomicCounter::new(),
                orders_placed: AtomicCounter::new(),
                orders_rejected: AtomicCounter::new(),
            }),
            config,
            sweeper: SingleInitGuard::new(),
        }
    }

    /// A customer's most recent orders, newest first.
    ///
    /// A cache hit never touches the ledger. On a miss the ledger is read and
    /// the result cached; failing to cache it does not fail the call.
    pub fn get_order_history(&self, customer: CustomerId) -> Result<Vec<Order>, ServiceError> {
        if let Some(orders) = self.shared.history.lookup(customer) {
            return Ok(orders);
        }

        let orders = self.shared.load_history(customer)?;
        self.shared.history.fill(customer, &orders);
        Ok(orders)
    }

    /// Same as [`get_order_history`](Self::get_order_history), but gives up on
    /// the ledger read after `timeout`.
    ///
    /// Cancellation is cooperative: a ledger read that misses the deadline
    /// still runs to completion in the background. A late result is usually
    /// not cached; one that finishes right at the deadline may still be,
    /// which is harmless since it is real ledger state.
    pub fn get_order_history_within(
        &self,
        customer: CustomerId,
        timeout: Duration,
    ) -> Result<Vec<Order>, ServiceError> {
        if let Some(orders) = self.shared.history.lookup(customer) {
            return Ok(orders);
        }

        let shared = Arc::clone(&self.shared);
        let orders = CancellableOperation::new(timeout)
            .named("order-history")
            .run(move |signal| {
                let orders = shared.load_history(customer)?;
                if signal.is_cancelled() {
                    trace!("service: history of customer {} arrived too late", customer);
                } else {
                    shared.history.fill(customer, &orders);
                }
                Ok::<_, LedgerError>(orders)
            })??;
        Ok(orders)
    }

    /// Records a purchase and returns the new order's id.
    ///
    /// A ledger failure is returned as is and leaves the cache untouched. Once
    /// the ledger commits, the call succeeds whatever happens to the cache.
    pub fn place_order(
        &self,
        item: ItemId,
        quantity: u32,
        customer: CustomerId,
    ) -> Result<OrderId, ServiceError> {
        let order = match self.shared.ledger.create_order(item, quantity, customer) {
            Ok(order) => order,
            Err(err) => {
                self.shared.orders_rejected.incr();
                debug!(
                    "service: order of {} x item {} for customer {} failed: {}",
                    quantity, item, customer, err
                );
                return Err(err.into());
            }
        };

        self.shared.orders_placed.incr();
        self.shared.history.record(&order);
        Ok(order.id)
    }

    /// Whether `quantity` units of `item` are in stock right now.
    pub fn check_availability(&self, item: ItemId, quantity: u32) -> Result<bool, ServiceError> {
        Ok(self.shared.ledger.check_availability(item, quantity)?)
    }

    /// Deadline-bounded [`check_availability`](Self::check_availability).
    pub fn check_availability_within(
        &self,
        item: ItemId,
        quantity: u32,
        timeout: Duration,
    ) -> Result<bool, ServiceError> {
        let shared = Arc::clone(&self.shared);
        let available = CancellableOperation::new(timeout)
            .named("availability")
            .run(move |_| shared.ledger.check_availability(item, quantity))??;
        Ok(available)
    }

    /// Every catalog item.
    pub fn catalog(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        Ok(self.shared.ledger.all_items()?)
    }

    /// Deadline-bounded [`catalog`](Self::catalog).
    pub fn catalog_within(&self, timeout: Duration) -> Result<Vec<InventoryItem>, ServiceError> {
        let shared = Arc::clone(&self.shared);
        let items = CancellableOperation::new(timeout)
            .named("catalog")
            .run(move |_| shared.ledger.all_items())??;
        Ok(items)
    }

    /// Catalog items carrying `label`.
    pub fn catalog_by_label(&self, label: &str) -> Result<Vec<InventoryItem>, ServiceError> {
        Ok(self.shared.ledger.items_by_label(label)?)
    }

    /// One catalog item.
    pub fn item(&self, id: ItemId) -> Result<InventoryItem, ServiceError> {
        Ok(self.shared.ledger.item(id)?)
    }

    /// Adds a catalog item.
    pub fn add_item(&self, item: NewItem) -> Result<ItemId, ServiceError> {
        Ok(self.shared.ledger.add_item(item)?)
    }

    /// One customer record.
    pub fn customer(&self, id: CustomerId) -> Result<Customer, ServiceError> {
        Ok(self.shared.ledger.customer(id)?)
    }

    /// Starts the background cache sweeper. Only the first call across all
    /// threads starts it; later calls are no-ops. The sweeper stops when the
    /// service is dropped.
    pub fn start_maintenance(&self) -> Result<(), ServiceError> {
        self.sweeper.get_or_try_init(|| {
            CacheSweeper::start(
                Arc::clone(self.shared.history.cache()),
                self.config.cache.sweep_interval(),
            )
        })?;
        Ok(())
    }

    /// Whether [`start_maintenance`](Self::start_maintenance) has succeeded.
    pub fn maintenance_running(&self) -> bool {
        self.sweeper.is_initialized()
    }

    /// Loads the histories of `customers` into the cache in parallel.
    ///
    /// Customers already cached are skipped and failures are logged. Returns
    /// how many histories were read from the ledger.
    pub fn warm_histories(&self, customers: &[CustomerId]) -> Result<usize, ServiceError> {
        let pool = BoundedTaskPool::with_name(
            "history-warmer",
            self.config.pool.worker_count,
            self.config.pool.queue_capacity,
        )?;

        for &customer in customers {
            let shared = Arc::clone(&self.shared);
            pool.submit(move || shared.warm(customer))?;
        }

        let loaded = pool.drain()?.into_iter().filter(|read| *read).count();
        debug!(
            "service: warmed {} of {} customer histories",
            loaded,
            customers.len()
        );
        Ok(loaded)
    }

    /// Counters of the service and its cache.
    pub fn stats(&self) -> ServiceStats {
        let shared = &self.shared;
        ServiceStats {
            cache: shared.history.cache().stats(),
            history_hits: shared.history.hits.get(),
            history_misses: shared.history.misses.get(),
            history_patches: shared.history.patches.get(),
            history_invalidations: shared.history.invalidations.get(),
            cache_failures: shared.history.failures.get(),
            ledger_reads: shared.ledger_reads.get(),
            orders_placed: shared.orders_placed.get(),
            orders_rejected: shared.orders_rejected.get(),
        }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &OrderLedger<S> {
        &self.shared.ledger
    }

    /// The cache holding encoded histories.
    pub fn cache(&self) -> &Arc<ShardedTtlCache<HistoryBytes>> {
        self.shared.history.cache()
    }

    /// Cache key of a customer's history under this service's window.
    pub fn history_key(&self, customer: CustomerId) -> String {
        self.shared.history.key(customer)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Point-in-time copy of [`OrderService`] counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub cache: CacheStatsSnapshot,
    /// History reads answered from the cache
    pub history_hits: u64,
    /// History reads that had to go to the ledger
    pub history_misses: u64,
    /// Writes folded into a cached history
    pub history_patches: u64,
    /// Writes that dropped a cached history instead
    pub history_invalidations: u64,
    /// Encode or decode failures, all recovered from
    pub cache_failures: u64,
    /// History reads issued to the ledger
    pub ledger_reads: u64,
    pub orders_placed: u64,
    pub orders_rejected: u64,
}
