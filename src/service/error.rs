//! Service-level error types

use crate::ledger::LedgerError;
use crate::sync::ToolkitError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned to callers of [`OrderService`](super::OrderService).
///
/// Cache problems never show up here; they are logged and the call falls
/// back to the ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The ledger refused or failed the request
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A deadline-bounded call ran out of time
    #[error("ledger call exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// A background primitive could not run
    #[error("concurrency toolkit failure: {0}")]
    Toolkit(ToolkitError),
}

impl From<ToolkitError> for ServiceError {
    fn from(err: ToolkitError) -> Self {
        match err {
            ToolkitError::DeadlineExceeded { after } => ServiceError::DeadlineExceeded(after),
            other => ServiceError::Toolkit(other),
        }
    }
}

/// Internal cache failures. Logged, counted, never returned.
#[derive(Debug, Error)]
pub(crate) enum CacheError {
    #[error("failed to encode order history: {0}")]
    Encode(serde_json::Error),

    #[error("failed to decode cached order history: {0}")]
    Decode(serde_json::Error),
}
