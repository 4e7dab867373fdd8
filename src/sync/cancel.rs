//! Deadline-bounded operations with cooperative cancellation.
//!
//! An operation is run on its own thread and raced against a deadline. When
//! the deadline wins the caller gets [`ToolkitError::DeadlineExceeded`]
//! straight away, but **the operation is not interrupted**: it keeps running
//! until it returns on its own and its result is discarded. Anything the
//! operation holds (connections, row locks, transactions) stays held until
//! then. Operations that want to stop early should poll
//! [`CancelSignal::is_cancelled`] at safe points.

use super::error::ToolkitError;
use crossbeam_channel::{RecvTimeoutError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

/// Shared completion/cancellation flag handed to a running operation.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Creates a signal in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the caller stopped waiting for the result.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Marks the signal cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Races an operation against a deadline. See the module docs for the
/// cooperative cancellation contract.
#[derive(Debug, Clone)]
pub struct CancellableOperation {
    name: String,
    deadline: Duration,
    signal: CancelSignal,
}

impl CancellableOperation {
    /// An operation that must complete within `deadline`.
    pub fn new(deadline: Duration) -> Self {
        Self {
            name: "operation".to_string(),
            deadline,
            signal: CancelSignal::new(),
        }
    }

    /// Names the operation for logs and its thread.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// The deadline applied by [`run`](Self::run).
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// A handle to the signal the operation will observe; lets a caller
    /// cancel before the deadline.
    pub fn signal(&self) -> CancelSignal {
        self.signal.clone()
    }

    /// Runs `operation` and waits for the earlier of its completion or the
    /// deadline.
    pub fn run<T, F>(self, operation: F) -> Result<T, ToolkitError>
    where
        T: Send + 'static,
        F: FnOnce(&CancelSignal) -> T + Send + 'static,
    {
        let (done_tx, done_rx) = bounded::<T>(1);
        let signal = self.signal.clone();

        thread::Builder::new()
            .name(format!("cancellable-{}", self.name))
            .spawn(move || {
                let output = operation(&signal);
                // The receiver is gone when the deadline already fired.
                let _ = done_tx.send(output);
            })
            .map_err(|err| ToolkitError::Spawn(err.to_string()))?;

        match done_rx.recv_timeout(self.deadline) {
            Ok(output) => {
                trace!("{}: completed within {:?}", self.name, self.deadline);
                Ok(output)
            }
            Err(RecvTimeoutError::Timeout) => {
                self.signal.cancel();
                debug!(
                    "{}: deadline of {:?} exceeded, result will be discarded",
                    self.name, self.deadline
                );
                Err(ToolkitError::DeadlineExceeded {
                    after: self.deadline,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(ToolkitError::OperationPanicked),
        }
    }
}
