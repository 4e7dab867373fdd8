//! Orchestration of the cache and the ledger.

mod config;
mod error;
mod history;
mod service;

pub use config::{PoolConfig, ServiceConfig};
pub use error::ServiceError;
pub use history::{HistoryBytes, history_key};
pub use service::{OrderService, ServiceStats};
