//! Concurrency toolkit error types

use std::time::Duration;
use thiserror::Error;

/// Errors reported by the toolkit primitives.
///
/// Every primitive reports failure through an ordinary `Result`; none of them
/// swallow a panic on the caller's behalf.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolkitError {
    /// The task pool no longer accepts work
    #[error("task pool is closed")]
    PoolClosed,

    /// A pool worker thread panicked while running a task
    #[error("pool worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker that died
        worker: usize,
    },

    /// The deadline elapsed before the operation completed
    #[error("deadline exceeded after {after:?}")]
    DeadlineExceeded {
        /// The deadline that was applied
        after: Duration,
    },

    /// The operation panicked instead of producing a value
    #[error("operation panicked before completing")]
    OperationPanicked,

    /// The operating system refused to start a thread
    #[error("failed to spawn thread: {0}")]
    Spawn(String),
}
