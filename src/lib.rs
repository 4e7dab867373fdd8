//! # Order Desk: Cached Order History over a Transactional Ledger
//!
//! A small order-processing backend. It answers whether an item is in stock,
//! records purchases against finite inventory, and serves a customer's recent
//! orders quickly and repeatedly. The interesting part is keeping a fast,
//! short-lived read cache consistent with an authoritative inventory/order
//! ledger while many threads read and write at once.
//!
//! ## Key Features
//!
//! - **Sharded TTL Cache**: `ShardedTtlCache` splits keys over independently
//!   locked shards selected by a deterministic hash. Entries expire lazily on
//!   read and eagerly through a background sweeper that never holds more than
//!   one shard at a time.
//!
//! - **Transactional Ledger**: `OrderLedger` re-checks stock inside the
//!   transaction, decrements it and inserts the order, all or nothing. Orders
//!   on the same item serialize on the store's row locks; orders on different
//!   items run in parallel.
//!
//! - **Cache-Aside Orchestration**: `OrderService` serves history from the
//!   cache when fresh and from the ledger otherwise, then patches or
//!   invalidates the cached history after every successful write. Cache
//!   failures never fail a call.
//!
//! - **Concurrency Toolkit**: bounded task pools with backpressure,
//!   wait/notify queues with sentinel shutdown, reader/writer locks,
//!   single-init guards, pooled scratch buffers and cooperative cancellation.
//!
//! ## Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`sync`] | `AtomicCounter`, `SharedExclusiveLock`, `WaitNotifyQueue`, `BoundedTaskPool`, `SingleInitGuard`, `BufferPool`, `CancellableOperation` |
//! | [`cache`] | `ShardedTtlCache`, `CacheSweeper`, `CacheConfig` |
//! | [`ledger`] | `OrderLedger`, the `TransactionalStore` traits and the in-process `MemoryStore` |
//! | [`service`] | `OrderService`, `ServiceConfig`, `ServiceError` |
//!
//! ## Consistency Model
//!
//! 1. **Inventory never goes negative.** Every decrement is checked under the
//!    item's row lock inside the ordering transaction.
//! 2. **An order exists exactly when its decrement was committed.** Both
//!    writes become visible together.
//! 3. **A cached history is always some real ledger state.** It may lag
//!    behind by at most its TTL, but it is never a torn mix of states. Write
//!    path patches run under the owning shard's exclusive lock, so concurrent
//!    orders for one customer never overwrite each other.
//! 4. **Shard assignment is fixed.** A key maps to the same shard for the
//!    cache's whole lifetime.
//!
//! ## Cancellation
//!
//! The `*_within` helpers race a ledger call against a deadline. Cancellation
//! is cooperative: a call that misses its deadline keeps running in the
//! background until it finishes, and only its result is discarded. Resources
//! held by that call are not released at the deadline.
//!
//! ## Configuration
//!
//! `ServiceConfig::load()` reads `config/orderdesk.toml` when present and then
//! applies `ORDERDESK_*` environment overrides, for example
//! `ORDERDESK_CACHE__SHARD_COUNT=32` or `ORDERDESK_HISTORY_WINDOW=20`.
//!
//! | Setting | Default |
//! |---------|---------|
//! | `cache.shard_count` | 64 |
//! | `cache.entry_ttl_ms` | 300000 |
//! | `cache.sweep_interval_ms` | 60000 |
//! | `pool.worker_count` | 4 |
//! | `pool.queue_capacity` | 64 |
//! | `history_window` | 10 |
//! | `ledger_timeout_ms` | 5000 |
//!
//! ## Logging
//!
//! The crate logs through `tracing`. Call [`setup_logger`] once to install a
//! subscriber whose level comes from the `LOGLEVEL` environment variable.
//!
//! ## Status
//! This project is currently in active development and is not yet suitable for production use.

pub mod cache;
pub mod ledger;
pub mod service;
pub mod sync;

mod utils;

pub use cache::{CacheConfig, ShardedTtlCache};
pub use ledger::{LedgerError, MemoryStore, OrderLedger};
pub use service::{OrderService, ServiceConfig, ServiceError};
pub use utils::{current_time_millis, setup_logger};
