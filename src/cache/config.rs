use serde::Deserialize;
use std::time::Duration;

/// Sizing and expiry settings for [`ShardedTtlCache`](super::ShardedTtlCache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of independently locked shards
    pub shard_count: usize,
    /// Lifetime of an entry written without an explicit TTL, in milliseconds
    pub entry_ttl_ms: u64,
    /// Pause between background sweeps, in milliseconds
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shard_count: 64,
            entry_ttl_ms: 5 * 60 * 1000,
            sweep_interval_ms: 60 * 1000,
        }
    }
}

impl CacheConfig {
    /// Default entry lifetime.
    pub fn entry_ttl(&self) -> Duration {
        Duration::from_millis(self.entry_ttl_ms)
    }

    /// Sweep period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
