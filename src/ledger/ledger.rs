//! Authoritative inventory and order operations.

use super::error::{LedgerError, Missing};
use super::model::{Customer, CustomerId, InventoryItem, ItemId, NewItem, Order};
use super::store::{StoreTransaction, TransactionalStore};
use tracing::{debug, trace, warn};

/// The source of truth for inventory and orders.
///
/// Every write goes through a store transaction; the ledger adds no locking
/// of its own. Concurrent orders for the same item serialize on the store's
/// row lock, orders for different items run in parallel. Errors are always
/// reported, never retried.
#[derive(Debug)]
pub struct OrderLedger<S> {
    store: S,
}

impl<S: TransactionalStore> OrderLedger<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether `quantity` units of `item` are available right now.
    ///
    /// Advisory only: [`create_order`](Self::create_order) checks again
    /// inside its transaction.
    pub fn check_availability(&self, item: ItemId, quantity: u32) -> Result<bool, LedgerError> {
        validate_quantity(quantity)?;
        let stored = self
            .store
            .item(item)?
            .ok_or(LedgerError::NotFound(Missing::Item(item)))?;
        trace!(
            "ledger: item {} has {} units, {} requested",
            item, stored.quantity, quantity
        );
        Ok(stored.quantity >= quantity)
    }

    /// Atomically checks stock, decrements it and records the order.
    ///
    /// Either both the decrement and the order row are committed or neither
    /// is. Returns the committed order.
    pub fn create_order(
        &self,
        item: ItemId,
        quantity: u32,
        customer: CustomerId,
    ) -> Result<Order, LedgerError> {
        validate_quantity(quantity)?;
        let mut tx = self.store.begin()?;

        match stage_order(&mut tx, item, quantity, customer) {
            Ok(order) => {
                tx.commit()?;
                debug!(
                    "ledger: order {} committed ({} x item {} for customer {})",
                    order.id, quantity, item, customer
                );
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!("ledger: rollback failed after {}: {}", err, rollback_err);
                }
                debug!("ledger: order for item {} rejected: {}", item, err);
                Err(err)
            }
        }
    }

    /// A customer's most recent orders, newest first, at most `limit`.
    pub fn recent_orders(&self, customer: CustomerId, limit: usize) -> Result<Vec<Order>, LedgerError> {
        let orders = self.store.recent_orders(customer, limit)?;
        trace!(
            "ledger: {} recent orders for customer {}",
            orders.len(),
            customer
        );
        Ok(orders)
    }

    /// One catalog item.
    pub fn item(&self, id: ItemId) -> Result<InventoryItem, LedgerError> {
        self.store
            .item(id)?
            .ok_or(LedgerError::NotFound(Missing::Item(id)))
    }

    /// The whole catalog.
    pub fn all_items(&self) -> Result<Vec<InventoryItem>, LedgerError> {
        Ok(self.store.items()?)
    }

    /// Catalog items with the given label.
    pub fn items_by_label(&self, label: &str) -> Result<Vec<InventoryItem>, LedgerError> {
        Ok(self.store.items_by_label(label)?)
    }

    /// Adds a catalog item.
    pub fn add_item(&self, item: NewItem) -> Result<ItemId, LedgerError> {
        Ok(self.store.insert_item(item)?)
    }

    /// One customer.
    pub fn customer(&self, id: CustomerId) -> Result<Customer, LedgerError> {
        self.store
            .customer(id)?
            .ok_or(LedgerError::NotFound(Missing::Customer(id)))
    }
}

// Runs inside the transaction; never trusts an earlier availability check.
fn stage_order<T: StoreTransaction>(
    tx: &mut T,
    item: ItemId,
    quantity: u32,
    customer: CustomerId,
) -> Result<Order, LedgerError> {
    if !tx.customer_exists(customer)? {
        return Err(LedgerError::NotFound(Missing::Customer(customer)));
    }
    let locked = tx
        .lock_item(item)?
        .ok_or(LedgerError::NotFound(Missing::Item(item)))?;
    if locked.quantity < quantity {
        return Err(LedgerError::InsufficientInventory {
            item,
            requested: quantity,
            available: locked.quantity,
        });
    }
    tx.decrement_inventory(item, quantity)?;
    Ok(tx.insert_order(item, customer, quantity)?)
}

fn validate_quantity(quantity: u32) -> Result<(), LedgerError> {
    if quantity == 0 {
        Err(LedgerError::InvalidQuantity(quantity))
    } else {
        Ok(())
    }
}
