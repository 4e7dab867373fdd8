//! Concurrent key/value store split into independently locked shards.

use super::config::CacheConfig;
use super::stats::{CacheStats, CacheStatsSnapshot};
use crate::sync::SharedExclusiveLock;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};
use tracing::trace;

/// A cached value and the instant after which it must no longer be served.
/// `None` means the TTL overflowed the clock and the entry never expires.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

type Shard<V> = SharedExclusiveLock<HashMap<String, CacheEntry<V>>>;

/// A string-keyed cache whose entries expire after a per-entry TTL.
///
/// Keys are assigned to one of `shard_count` shards by a deterministic hash,
/// and every operation locks only the owning shard: `get` takes the shard's
/// shared lock, `set`/`delete` its exclusive lock. No operation ever holds
/// two shard locks, so traffic on different shards never contends.
///
/// Expired entries are never returned. A lookup that finds one removes it
/// (lazy expiry) and [`purge_expired`](Self::purge_expired), normally driven
/// by a [`CacheSweeper`](super::CacheSweeper), reclaims the rest.
///
/// Misses are not errors and the cache reports none; callers must treat it
/// as an optimization over a source of truth.
#[derive(Debug)]
pub struct ShardedTtlCache<V> {
    shards: Box<[Shard<V>]>,
    default_ttl: Duration,
    stats: CacheStats,
}

impl<V: Clone> ShardedTtlCache<V> {
    /// Creates a cache with `shard_count` shards (at least one) whose
    /// [`insert`](Self::insert) uses `default_ttl`.
    pub fn new(shard_count: usize, default_ttl: Duration) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| SharedExclusiveLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            default_ttl,
            stats: CacheStats::default(),
        }
    }

    /// Creates a cache sized from `config`.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.shard_count, config.entry_ttl())
    }

    /// Index of the shard that owns `key`. Pure function of the key and the
    /// shard count, so it never changes for the lifetime of the cache.
    pub fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Returns the live value for `key`.
    ///
    /// An entry found past its expiry is evicted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let shard = self.shard(key);
        {
            let entries = shard.read();
            match entries.get(key) {
                None => {
                    self.stats.misses.incr();
                    return None;
                }
                Some(entry) if !entry.is_expired(Instant::now()) => {
                    self.stats.hits.incr();
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Expired under the shared lock: re-check under the exclusive one,
        // a concurrent `set` may have refreshed it in between.
        let mut entries = shard.write();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                self.stats.hits.incr();
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.stats.lazy_evictions.incr();
                self.stats.misses.incr();
                trace!("cache: lazily evicted expired key {}", key);
                None
            }
            None => {
                self.stats.misses.incr();
                None
            }
        }
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let shard = self.shard(&key);
        shard.write().insert(key, CacheEntry::new(value, ttl));
        self.stats.writes.incr();
    }

    /// Stores `value` under `key` with the cache's default TTL.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Read-modify-write of a live entry under the shard's exclusive lock.
    ///
    /// If `key` holds a live value, `f` receives it: returning `Some` stores
    /// the new value with a fresh `ttl`, returning `None` removes the entry.
    /// An absent or expired entry is left absent and `f` is not called.
    /// Returns whether a new value was stored.
    pub fn update<F>(&self, key: &str, ttl: Duration, f: F) -> bool
    where
        F: FnOnce(&V) -> Option<V>,
    {
        let mut entries = self.shard(key).write();
        let now = Instant::now();
        let replacement = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => f(&entry.value),
            Some(_) => {
                self.stats.lazy_evictions.incr();
                None
            }
            None => return false,
        };

        match replacement {
            Some(value) => {
                entries.insert(key.to_string(), CacheEntry::new(value, ttl));
                self.stats.writes.incr();
                true
            }
            None => {
                entries.remove(key);
                false
            }
        }
    }

    /// Removes `key`. Returns whether an entry (live or expired) was present.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.shard(key).write().remove(key).is_some();
        if removed {
            self.stats.deletes.incr();
        }
        removed
    }

    /// Removes every expired entry, one shard at a time, and returns how many
    /// were removed. Each shard's exclusive lock is held only while that
    /// shard is scanned.
    pub fn purge_expired(&self) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let now = Instant::now();
            let mut entries = shard.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            removed += before - entries.len();
        }
        self.stats.swept.add(removed as u64);
        self.stats.sweeps.incr();
        removed
    }

    /// Drops every entry.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// TTL applied by [`insert`](Self::insert).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Counter snapshot.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Holds `key`'s shard exclusively while `f` runs. Lets tests and
    /// benchmarks observe shard isolation.
    #[doc(hidden)]
    pub fn with_shard_locked<R>(&self, key: &str, f: impl FnOnce() -> R) -> R {
        let _guard = self.shard(key).write();
        f()
    }

    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }
}
