//! The boundary between the ledger and the durable store behind it.
//!
//! The ledger only needs plain reads plus a transaction that can lock an
//! item row, stage writes and commit or roll them back atomically. Any store
//! with at least read-committed isolation and row-level locking can sit
//! behind these traits.

use super::error::StoreError;
use super::model::{Customer, CustomerId, InventoryItem, ItemId, NewItem, Order};

/// A store holding inventory, customers and orders.
///
/// Reads outside a transaction see only committed state.
pub trait TransactionalStore: Send + Sync {
    /// Transaction handle; borrows the store for its lifetime.
    type Tx<'a>: StoreTransaction
    where
        Self: 'a;

    /// Opens a transaction.
    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;

    /// Reads one item.
    fn item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    /// Reads every item, ordered by id.
    fn items(&self) -> Result<Vec<InventoryItem>, StoreError>;

    /// Reads the items whose label matches exactly, ordered by id.
    fn items_by_label(&self, label: &str) -> Result<Vec<InventoryItem>, StoreError>;

    /// Inserts a catalog item and returns its new id.
    fn insert_item(&self, item: NewItem) -> Result<ItemId, StoreError>;

    /// Reads one customer.
    fn customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Reads a customer's orders, newest first, at most `limit` of them.
    fn recent_orders(&self, customer: CustomerId, limit: usize) -> Result<Vec<Order>, StoreError>;
}

/// An open transaction. Nothing it writes is visible to anyone else until
/// [`commit`](Self::commit) succeeds; dropping it without committing rolls it
/// back.
pub trait StoreTransaction {
    /// Reads an item and locks its row until the transaction ends, so
    /// concurrent transactions on the same item serialize here.
    fn lock_item(&mut self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    /// Whether the customer exists.
    fn customer_exists(&mut self, id: CustomerId) -> Result<bool, StoreError>;

    /// Subtracts `quantity` from a row previously locked with
    /// [`lock_item`](Self::lock_item). Fails with
    /// [`StoreError::Constraint`] if the balance would go negative.
    fn decrement_inventory(&mut self, id: ItemId, quantity: u32) -> Result<(), StoreError>;

    /// Inserts an order row and returns it with its assigned id and
    /// timestamp.
    fn insert_order(
        &mut self,
        item: ItemId,
        customer: CustomerId,
        quantity: u32,
    ) -> Result<Order, StoreError>;

    /// Makes every staged write visible at once.
    fn commit(self) -> Result<(), StoreError>;

    /// Discards every staged write.
    fn rollback(self) -> Result<(), StoreError>;
}
