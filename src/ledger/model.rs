//! Inventory, order and customer records held by the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Identifier of an [`InventoryItem`]
    ItemId
);
id_type!(
    /// Identifier of a [`Customer`]
    CustomerId
);
id_type!(
    /// Identifier of an [`Order`], assigned by the store on insert
    OrderId
);

/// A purchasable item and how many units remain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Immutable identifier
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Secondary display label (artist, brand, ...)
    pub label: String,
    /// Unit price
    pub price: Decimal,
    /// Units available for purchase; never negative
    pub quantity: u32,
}

/// Fields for a catalog item that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Display title
    pub title: String,
    /// Secondary display label
    pub label: String,
    /// Unit price
    pub price: Decimal,
    /// Initial stock
    pub quantity: u32,
}

impl NewItem {
    /// Convenience constructor.
    pub fn new(title: &str, label: &str, price: Decimal, quantity: u32) -> Self {
        Self {
            title: title.to_string(),
            label: label.to_string(),
            price,
            quantity,
        }
    }
}

/// A committed purchase. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier assigned by the store
    pub id: OrderId,
    /// Item purchased
    pub item_id: ItemId,
    /// Purchasing customer
    pub customer_id: CustomerId,
    /// Units purchased, always positive
    pub quantity: u32,
    /// Creation time, milliseconds since UNIX epoch
    pub timestamp: u64,
}

/// A customer that may place orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub address: String,
    pub phone: String,
}
