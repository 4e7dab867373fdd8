//! Sharded, time-expiring read cache.

mod config;
mod sharded;
mod stats;
mod sweeper;

pub use config::CacheConfig;
pub use sharded::ShardedTtlCache;
pub use stats::CacheStatsSnapshot;
pub use sweeper::CacheSweeper;
