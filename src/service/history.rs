//! Cached order histories: keys, encoding and the patch-or-invalidate rule.

use super::error::CacheError;
use crate::cache::ShardedTtlCache;
use crate::ledger::{CustomerId, Order};
use crate::sync::{AtomicCounter, BufferPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// Encoded order list as stored in the cache.
pub type HistoryBytes = Arc<[u8]>;

/// Cache key for a customer's most recent `window` orders.
pub fn history_key(customer: CustomerId, window: usize) -> String {
    format!("orders:customer:{}:last{}", customer, window)
}

/// The order-history view over the shared cache.
///
/// Values are JSON arrays of orders, newest first, encoded through pooled
/// buffers.
#[derive(Debug)]
pub(crate) struct HistoryCache {
    cache: Arc<ShardedTtlCache<HistoryBytes>>,
    buffers: BufferPool,
    window: usize,
    ttl: Duration,
    pub(crate) hits: AtomicCounter,
    pub(crate) misses: AtomicCounter,
    pub(crate) patches: AtomicCounter,
    pub(crate) invalidations: AtomicCounter,
    pub(crate) failures: AtomicCounter,
}

impl HistoryCache {
    pub(crate) fn new(cache: Arc<ShardedTtlCache<HistoryBytes>>, window: usize, ttl: Duration) -> Self {
        Self {
            cache,
            buffers: BufferPool::new(),
            window,
            ttl,
            hits: AtomicCounter::new(),
            misses: AtomicCounter::new(),
            patches: AtomicCounter::new(),
            invalidations: AtomicCounter::new(),
            failures: AtomicCounter::new(),
        }
    }

    pub(crate) fn cache(&self) -> &Arc<ShardedTtlCache<HistoryBytes>> {
        &self.cache
    }

    pub(crate) fn window(&self) -> usize {
        self.window
    }

    pub(crate) fn key(&self, customer: CustomerId) -> String {
        history_key(customer, self.window)
    }

    /// Cached history, if present and decodable. An undecodable entry is
    /// dropped and reported as a miss.
    pub(crate) fn lookup(&self, customer: CustomerId) -> Option<Vec<Order>> {
        let key = self.key(customer);
        let Some(bytes) = self.cache.get(&key) else {
            self.misses.incr();
            trace!("history: miss for {}", key);
            return None;
        };

        match decode(&bytes) {
            Ok(orders) => {
                self.hits.incr();
                trace!("history: hit for {} ({} orders)", key, orders.len());
                Some(orders)
            }
            Err(err) => {
                self.fail(&key, &err);
                self.cache.delete(&key);
                self.misses.incr();
                None
            }
        }
    }

    /// Stores a freshly read history. Failures are logged and swallowed.
    pub(crate) fn fill(&self, customer: CustomerId, orders: &[Order]) {
        let key = self.key(customer);
        match self.encode(orders) {
            Ok(bytes) => {
                self.cache.set(key.as_str(), bytes, self.ttl);
                trace!("history: populated {} with {} orders", key, orders.len());
            }
            Err(err) => self.fail(&key, &err),
        }
    }

    /// Folds a just-committed order into the customer's cached history.
    ///
    /// A live entry is patched in place under its shard lock: the order is
    /// added, the list re-sorted newest first and cut to the window. If there
    /// is no live entry, or it cannot be decoded or re-encoded, the key is
    /// deleted instead so the next read goes to the ledger.
    pub(crate) fn record(&self, order: &Order) {
        let key = self.key(order.customer_id);
        let mut failure = None;

        let patched = self.cache.update(&key, self.ttl, |bytes| {
            let result = decode(bytes)
                .map(|orders| self.with_new_order(orders, order))
                .and_then(|orders| self.encode(&orders));
            match result {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    failure = Some(err);
                    None
                }
            }
        });

        if let Some(err) = failure {
            self.fail(&key, &err);
        }

        if patched {
            self.patches.incr();
            trace!("history: patched {} with order {}", key, order.id);
        } else {
            self.cache.delete(&key);
            self.invalidations.incr();
            trace!("history: invalidated {}", key);
        }
    }

    fn with_new_order(&self, mut orders: Vec<Order>, order: &Order) -> Vec<Order> {
        if !orders.iter().any(|existing| existing.id == order.id) {
            orders.push(order.clone());
        }
        orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        orders.truncate(self.window);
        orders
    }

    fn encode(&self, orders: &[Order]) -> Result<HistoryBytes, CacheError> {
        let mut buf = self.buffers.acquire();
        serde_json::to_writer(&mut *buf, orders).map_err(CacheError::Encode)?;
        Ok(Arc::from(buf.as_slice()))
    }

    fn fail(&self, key: &str, err: &CacheError) {
        self.failures.incr();
        warn!("history: cache problem on {}: {}", key, err);
    }
}

fn decode(bytes: &[u8]) -> Result<Vec<Order>, CacheError> {
    serde_json::from_slice(bytes).map_err(CacheError::Decode)
}
