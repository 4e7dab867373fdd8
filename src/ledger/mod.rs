//! Transactional inventory/order ledger and the store boundary beneath it.

mod error;
mod ledger;
mod memory;
mod model;
mod store;

pub use error::{LedgerError, Missing, StoreError};
pub use ledger::OrderLedger;
pub use memory::{MemoryStore, MemoryTransaction};
pub use model::{Customer, CustomerId, InventoryItem, ItemId, NewItem, Order, OrderId};
pub use store::{StoreTransaction, TransactionalStore};
