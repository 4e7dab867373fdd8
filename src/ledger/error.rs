//! Ledger and store error types

use super::model::{CustomerId, ItemId};
use thiserror::Error;

/// Failures reported by a [`TransactionalStore`](super::TransactionalStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or refused the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer in time
    #[error("store timed out")]
    Timeout,

    /// The transaction was already committed or rolled back
    #[error("transaction already committed or rolled back")]
    TransactionClosed,

    /// A statement violated a store-side integrity check
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// What a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// No such inventory item
    Item(ItemId),
    /// No such customer
    Customer(CustomerId),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Item(id) => write!(f, "item {}", id),
            Missing::Customer(id) => write!(f, "customer {}", id),
        }
    }
}

/// Errors surfaced by [`OrderLedger`](super::OrderLedger).
///
/// Only `Transient` is worth retrying, and the ledger never retries on its
/// own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The referenced record does not exist
    #[error("not found: {0}")]
    NotFound(Missing),

    /// Not enough stock to fill the order
    #[error("insufficient inventory for item {item}: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Item that ran short
        item: ItemId,
        /// Units requested
        requested: u32,
        /// Units available when checked inside the transaction
        available: u32,
    },

    /// Quantities must be positive
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The store was unreachable or timed out
    #[error("transient store failure: {0}")]
    Transient(StoreError),

    /// The store rejected a statement
    #[error("store rejected the request: {0}")]
    Rejected(StoreError),
}

impl LedgerError {
    /// True for failures a caller may reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transient(_))
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint(_) => LedgerError::Rejected(err),
            StoreError::Unavailable(_) | StoreError::Timeout | StoreError::TransactionClosed => {
                LedgerError::Transient(err)
            }
        }
    }
}
