//! Concurrency toolkit: the reusable primitives the cache, ledger and service
//! layers are built from.

mod buffer;
mod cancel;
mod counter;
mod error;
mod once;
mod pool;
mod queue;
mod rwlock;
mod tests;

pub use buffer::{BufferPool, PooledBuffer};
pub use cancel::{CancelSignal, CancellableOperation};
pub use counter::AtomicCounter;
pub use error::ToolkitError;
pub use once::SingleInitGuard;
pub use pool::BoundedTaskPool;
pub use queue::WaitNotifyQueue;
pub use rwlock::SharedExclusiveLock;
