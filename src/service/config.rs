//! Service configuration: cache sizing, pool sizing and ledger deadlines.

use crate::cache::CacheConfig;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const CONFIG_FILE: &str = "config/orderdesk.toml";
const ENV_PREFIX: &str = "ORDERDESK";

/// Sizing of the pool used for batch work such as cache warming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Worker threads
    pub worker_count: usize,
    /// Tasks that may wait in the queue before `submit` blocks
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 64,
        }
    }
}

/// Everything [`OrderService`](super::OrderService) can be tuned with. Every
/// field has a default, so an empty file or environment yields a working
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub pool: PoolConfig,
    /// How many recent orders a history holds
    pub history_window: usize,
    /// Suggested deadline for callers of the `*_within` helpers, in
    /// milliseconds. The service never applies it on its own; each helper
    /// takes its deadline explicitly.
    pub ledger_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            pool: PoolConfig::default(),
            history_window: 10,
            ledger_timeout_ms: 5_000,
        }
    }
}

impl ServiceConfig {
    /// Loads `config/orderdesk.toml` if present, then applies environment
    /// overrides such as `ORDERDESK_CACHE__SHARD_COUNT=32`.
    ///
    /// An unreadable file is logged and skipped in favour of the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env_source());

        let settings = match builder.build() {
            Ok(settings) => settings,
            Err(err) => {
                if Path::new(CONFIG_FILE).exists() {
                    warn!("config: failed to read {}, using env only: {}", CONFIG_FILE, err);
                }
                Config::builder().add_source(env_source()).build()?
            }
        };

        settings.try_deserialize::<ServiceConfig>().map(Self::normalized)
    }

    /// Parses a TOML document, applying defaults for anything missing.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize::<ServiceConfig>()
            .map(Self::normalized)
    }

    /// Replaces the cache section.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self.normalized()
    }

    /// Replaces the default entry TTL.
    pub fn with_entry_ttl(mut self, ttl: Duration) -> Self {
        self.cache.entry_ttl_ms = ttl.as_millis() as u64;
        self
    }

    /// Replaces the sweep interval. Anything under a millisecond becomes one.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.cache.sweep_interval_ms = interval.as_millis() as u64;
        self.normalized()
    }

    /// Replaces the pool section.
    pub fn with_pool(mut self, worker_count: usize, queue_capacity: usize) -> Self {
        self.pool = PoolConfig {
            worker_count,
            queue_capacity,
        };
        self.normalized()
    }

    /// Replaces the history window.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self.normalized()
    }

    /// Replaces the default ledger deadline.
    pub fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Deadline to hand to the `*_within` helpers.
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    // Zero makes no sense for any of these; a zero sweep interval would spin.
    fn normalized(mut self) -> Self {
        self.cache.shard_count = self.cache.shard_count.max(1);
        self.cache.sweep_interval_ms = self.cache.sweep_interval_ms.max(1);
        self.pool.worker_count = self.pool.worker_count.max(1);
        self.pool.queue_capacity = self.pool.queue_capacity.max(1);
        self.history_window = self.history_window.max(1);
        self
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
