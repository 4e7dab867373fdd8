use crate::sync::AtomicCounter;
use serde::{Deserialize, Serialize};

/// Live counters maintained by the cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub(super) hits: AtomicCounter,
    pub(super) misses: AtomicCounter,
    pub(super) writes: AtomicCounter,
    pub(super) deletes: AtomicCounter,
    pub(super) lazy_evictions: AtomicCounter,
    pub(super) swept: AtomicCounter,
    pub(super) sweeps: AtomicCounter,
}

impl CacheStats {
    /// Copies the counters into a plain, serializable value.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.get(),
            misses: self.misses.get(),
            writes: self.writes.get(),
            deletes: self.deletes.get(),
            lazy_evictions: self.lazy_evictions.get(),
            swept: self.swept.get(),
            sweeps: self.sweeps.get(),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Successful `set` calls
    pub writes: u64,
    /// `delete` calls that removed an entry
    pub deletes: u64,
    /// Expired entries removed by a lookup
    pub lazy_evictions: u64,
    /// Expired entries removed by sweeps
    pub swept: u64,
    /// Completed sweeps
    pub sweeps: u64,
}

impl CacheStatsSnapshot {
    /// Fraction of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}
