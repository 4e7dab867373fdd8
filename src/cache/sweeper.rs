//! Background reclamation of expired cache entries.

use super::sharded::ShardedTtlCache;
use crate::sync::ToolkitError;
use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

// Shortest pause between sweeps.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Periodically calls [`ShardedTtlCache::purge_expired`] on a dedicated
/// thread until stopped or dropped.
#[derive(Debug)]
pub struct CacheSweeper {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl CacheSweeper {
    /// Starts sweeping `cache` every `interval`, at least one millisecond.
    pub fn start<V>(cache: Arc<ShardedTtlCache<V>>, interval: Duration) -> Result<Self, ToolkitError>
    where
        V: Clone + Send + Sync + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("cache-sweeper".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let removed = cache.purge_expired();
                            trace!("sweeper: removed {} expired entries", removed);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("sweeper: stopped");
            })
            .map_err(|err| ToolkitError::Spawn(err.to_string()))?;

        debug!("sweeper: started with interval {:?}", interval);
        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
            interval,
        })
    }

    /// Pause between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the sweeper and waits for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread.
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}
