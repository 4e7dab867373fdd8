//! In-process reference implementation of the store traits.

use super::error::StoreError;
use super::model::{Customer, CustomerId, InventoryItem, ItemId, NewItem, Order, OrderId};
use super::store::{StoreTransaction, TransactionalStore};
use crate::sync::{AtomicCounter, SharedExclusiveLock};
use crate::utils::current_time_millis;
use dashmap::DashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};
use uuid::Uuid;

const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

type RowGuard = ArcMutexGuard<RawMutex, ()>;

/// A [`TransactionalStore`] kept entirely in memory.
///
/// Committed rows live in concurrent maps. Each item also has a row lock that
/// a transaction takes in [`lock_item`](StoreTransaction::lock_item) and holds
/// until it ends, so transactions on one item run one at a time while
/// transactions on different items proceed in parallel. Staged writes are
/// applied on commit inside a short exclusive section that plain reads also
/// pass through, so no reader ever sees a decrement without its order.
///
/// Fault injection hooks ([`set_unavailable`](Self::set_unavailable),
/// [`fail_next_commit`](Self::fail_next_commit),
/// [`set_read_latency`](Self::set_read_latency)) exist to exercise the
/// failure paths of the layers above.
#[derive(Debug)]
pub struct MemoryStore {
    items: DashMap<ItemId, InventoryItem>,
    row_locks: DashMap<ItemId, Arc<Mutex<()>>>,
    customers: DashMap<CustomerId, Customer>,
    orders: DashMap<CustomerId, Vec<Order>>,
    commit_section: SharedExclusiveLock<()>,
    item_ids: AtomicCounter,
    customer_ids: AtomicCounter,
    order_ids: AtomicCounter,
    lock_wait: Duration,
    unavailable: AtomicBool,
    fail_next_commit: AtomicBool,
    read_latency_ms: AtomicU64,
    commits: AtomicCounter,
    rollbacks: AtomicCounter,
    history_reads: AtomicCounter,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_lock_wait(DEFAULT_LOCK_WAIT)
    }

    /// Creates an empty store whose transactions give up with
    /// [`StoreError::Timeout`] after waiting `lock_wait` for a row lock.
    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            items: DashMap::new(),
            row_locks: DashMap::new(),
            customers: DashMap::new(),
            orders: DashMap::new(),
            commit_section: SharedExclusiveLock::new(()),
            item_ids: AtomicCounter::new(),
            customer_ids: AtomicCounter::new(),
            order_ids: AtomicCounter::new(),
            lock_wait,
            unavailable: AtomicBool::new(false),
            fail_next_commit: AtomicBool::new(false),
            read_latency_ms: AtomicU64::new(0),
            commits: AtomicCounter::new(),
            rollbacks: AtomicCounter::new(),
            history_reads: AtomicCounter::new(),
        }
    }

    /// Adds a customer and returns the assigned id.
    pub fn register_customer(&self, full_name: &str, address: &str, phone: &str) -> CustomerId {
        let id = CustomerId(self.customer_ids.next());
        self.insert_customer(Customer {
            id,
            full_name: full_name.to_string(),
            address: address.to_string(),
            phone: phone.to_string(),
        });
        id
    }

    /// Adds or replaces a customer under a caller-chosen id.
    pub fn insert_customer(&self, customer: Customer) {
        trace!("store: customer {} registered", customer.id);
        self.customers.insert(customer.id, customer);
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`]
    /// until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes the next commit fail after its writes were staged.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Delays every non-transactional read by `latency`.
    pub fn set_read_latency(&self, latency: Duration) {
        self.read_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Transactions committed so far.
    pub fn commits(&self) -> u64 {
        self.commits.get()
    }

    /// Transactions rolled back so far, explicitly or by drop.
    pub fn rollbacks(&self) -> u64 {
        self.rollbacks.get()
    }

    /// Calls to [`recent_orders`](TransactionalStore::recent_orders) so far.
    pub fn history_reads(&self) -> u64 {
        self.history_reads.get()
    }

    /// Every committed order, across customers, ordered by id.
    pub fn all_orders(&self) -> Vec<Order> {
        let _section = self.commit_section.read();
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|order| order.id);
        orders
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn simulate_read(&self) -> Result<(), StoreError> {
        let latency = self.read_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            thread::sleep(Duration::from_millis(latency));
        }
        self.ensure_available()
    }

    fn row_lock(&self, id: ItemId) -> Arc<Mutex<()>> {
        // Clone the Arc out so the map shard is released before blocking.
        self.row_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn apply(&self, staged: &mut Staged) {
        let _section = self.commit_section.write();
        for (item_id, quantity) in staged.decrements.drain(..) {
            if let Some(mut item) = self.items.get_mut(&item_id) {
                item.quantity = item.quantity.saturating_sub(quantity);
            }
        }
        for order in staged.orders.drain(..) {
            self.orders.entry(order.customer_id).or_default().push(order);
        }
    }
}

impl TransactionalStore for MemoryStore {
    type Tx<'a> = MemoryTransaction<'a>;

    fn begin(&self) -> Result<MemoryTransaction<'_>, StoreError> {
        self.ensure_available()?;
        let id = Uuid::new_v4();
        trace!("store: begin tx {}", id);
        Ok(MemoryTransaction {
            store: self,
            id,
            rows: HashMap::new(),
            staged: Staged::default(),
            finished: false,
        })
    }

    fn item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        self.simulate_read()?;
        let _section = self.commit_section.read();
        Ok(self.items.get(&id).map(|item| item.value().clone()))
    }

    fn items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.simulate_read()?;
        let _section = self.commit_section.read();
        let mut items: Vec<InventoryItem> =
            self.items.iter().map(|item| item.value().clone()).collect();
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    fn items_by_label(&self, label: &str) -> Result<Vec<InventoryItem>, StoreError> {
        Ok(self
            .items()?
            .into_iter()
            .filter(|item| item.label == label)
            .collect())
    }

    fn insert_item(&self, item: NewItem) -> Result<ItemId, StoreError> {
        self.ensure_available()?;
        let id = ItemId(self.item_ids.next());
        let _section = self.commit_section.write();
        self.items.insert(
            id,
            InventoryItem {
                id,
                title: item.title,
                label: item.label,
                price: item.price,
                quantity: item.quantity,
            },
        );
        debug!("store: item {} inserted", id);
        Ok(id)
    }

    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        self.simulate_read()?;
        Ok(self.customers.get(&id).map(|customer| customer.value().clone()))
    }

    fn recent_orders(&self, customer: CustomerId, limit: usize) -> Result<Vec<Order>, StoreError> {
        self.history_reads.incr();
        self.simulate_read()?;
        let _section = self.commit_section.read();
        let mut orders = self
            .orders
            .get(&customer)
            .map(|orders| orders.value().clone())
            .unwrap_or_default();
        orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        orders.truncate(limit);
        Ok(orders)
    }
}

#[derive(Debug, Default)]
struct Staged {
    decrements: Vec<(ItemId, u32)>,
    orders: Vec<Order>,
}

/// A transaction against a [`MemoryStore`].
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    id: Uuid,
    rows: HashMap<ItemId, RowGuard>,
    staged: Staged,
    finished: bool,
}

impl MemoryTransaction<'_> {
    /// Transaction id, used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.finished {
            Err(StoreError::TransactionClosed)
        } else {
            Ok(())
        }
    }

    // Committed quantity minus what this transaction already staged.
    fn visible_quantity(&self, id: ItemId) -> Option<u32> {
        let committed = self.store.items.get(&id)?.quantity;
        let staged: u32 = self
            .staged
            .decrements
            .iter()
            .filter(|(item, _)| *item == id)
            .map(|(_, quantity)| *quantity)
            .sum();
        Some(committed.saturating_sub(staged))
    }

    fn discard(&mut self) {
        self.staged = Staged::default();
        self.rows.clear();
        self.finished = true;
        self.store.rollbacks.incr();
        trace!("store: rollback tx {}", self.id);
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn lock_item(&mut self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        self.ensure_open()?;
        self.store.ensure_available()?;
        if !self.rows.contains_key(&id) {
            let lock = self.store.row_lock(id);
            let guard = lock
                .try_lock_arc_for(self.store.lock_wait)
                .ok_or(StoreError::Timeout)?;
            self.rows.insert(id, guard);
        }

        let quantity = self.visible_quantity(id);
        Ok(self.store.items.get(&id).map(|item| {
            let mut item = item.value().clone();
            item.quantity = quantity.unwrap_or(item.quantity);
            item
        }))
    }

    fn customer_exists(&mut self, id: CustomerId) -> Result<bool, StoreError> {
        self.ensure_open()?;
        self.store.ensure_available()?;
        Ok(self.store.customers.contains_key(&id))
    }

    fn decrement_inventory(&mut self, id: ItemId, quantity: u32) -> Result<(), StoreError> {
        self.ensure_open()?;
        if !self.rows.contains_key(&id) {
            return Err(StoreError::Constraint(format!("row for item {} is not locked", id)));
        }
        let available = self
            .visible_quantity(id)
            .ok_or_else(|| StoreError::Constraint(format!("item {} does not exist", id)))?;
        if quantity > available {
            return Err(StoreError::Constraint(format!(
                "item {} quantity would drop below zero",
                id
            )));
        }
        self.staged.decrements.push((id, quantity));
        Ok(())
    }

    fn insert_order(
        &mut self,
        item: ItemId,
        customer: CustomerId,
        quantity: u32,
    ) -> Result<Order, StoreError> {
        self.ensure_open()?;
        let order = Order {
            id: OrderId(self.store.order_ids.next()),
            item_id: item,
            customer_id: customer,
            quantity,
            timestamp: current_time_millis(),
        };
        self.staged.orders.push(order.clone());
        Ok(order)
    }

    fn commit(mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if let Err(err) = self.store.ensure_available() {
            self.discard();
            return Err(err);
        }
        if self.store.fail_next_commit.swap(false, Ordering::SeqCst) {
            self.discard();
            return Err(StoreError::Unavailable("connection lost during commit".to_string()));
        }

        let store = self.store;
        store.apply(&mut self.staged);
        self.finished = true;
        store.commits.incr();
        trace!("store: commit tx {}", self.id);
        // Row locks are released when `self` drops.
        Ok(())
    }

    fn rollback(mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.discard();
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.discard();
        }
    }
}
