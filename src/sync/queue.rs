//! Unbounded producer/consumer queue with wait/notify hand-off.

use super::counter::AtomicCounter;
use super::error::ToolkitError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

/// What a slot in the queue holds: a real item or the shutdown sentinel.
#[derive(Debug)]
enum Slot<T> {
    Item(T),
    Sentinel,
}

/// A mutex-protected FIFO with a condition variable for blocking consumers.
///
/// Any number of producers and consumers may share one queue. `push` never
/// blocks; `pop` parks the caller while the queue is empty and wakes on the
/// next push. Consumers are shut down by pushing one sentinel per consumer
/// (see [`shutdown`](Self::shutdown)); a consumer that pops a sentinel sees
/// `None` and is expected to exit. Items pushed before the sentinels are
/// still delivered first.
#[derive(Debug)]
pub struct WaitNotifyQueue<T> {
    slots: Mutex<VecDeque<Slot<T>>>,
    ready: Condvar,
    pushed: AtomicCounter,
    delivered: AtomicCounter,
}

impl<T> Default for WaitNotifyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WaitNotifyQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            pushed: AtomicCounter::new(),
            delivered: AtomicCounter::new(),
        }
    }

    /// Appends an item and wakes one waiting consumer.
    pub fn push(&self, item: T) {
        self.slots.lock().push_back(Slot::Item(item));
        self.pushed.incr();
        self.ready.notify_one();
    }

    /// Appends `consumers` sentinels, one for each consumer that should exit.
    pub fn shutdown(&self, consumers: usize) {
        {
            let mut slots = self.slots.lock();
            for _ in 0..consumers {
                slots.push_back(Slot::Sentinel);
            }
        }
        trace!("queue shutdown: {} sentinels pushed", consumers);
        self.ready.notify_all();
    }

    /// Removes the next item, blocking while the queue is empty.
    ///
    /// Returns `None` when the caller received a shutdown sentinel.
    pub fn pop(&self) -> Option<T> {
        let mut slots = self.slots.lock();
        loop {
            if let Some(slot) = slots.pop_front() {
                return self.deliver(slot);
            }
            self.ready.wait(&mut slots);
        }
    }

    /// Like [`pop`](Self::pop) but gives up once `timeout` has elapsed.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<Option<T>, ToolkitError> {
        let deadline = Instant::now() + timeout;
        let mut slots = self.slots.lock();
        loop {
            if let Some(slot) = slots.pop_front() {
                return Ok(self.deliver(slot));
            }
            if self.ready.wait_until(&mut slots, deadline).timed_out() && slots.is_empty() {
                return Err(ToolkitError::DeadlineExceeded { after: timeout });
            }
        }
    }

    /// Removes the next item without blocking. `None` means nothing was
    /// available; `Some(None)` means a sentinel was taken.
    pub fn try_pop(&self) -> Option<Option<T>> {
        let slot = self.slots.lock().pop_front()?;
        Some(self.deliver(slot))
    }

    /// Number of queued slots, sentinels included.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Total items pushed over the queue's lifetime.
    pub fn pushed(&self) -> u64 {
        self.pushed.get()
    }

    /// Total items handed to consumers over the queue's lifetime.
    pub fn delivered(&self) -> u64 {
        self.delivered.get()
    }

    fn deliver(&self, slot: Slot<T>) -> Option<T> {
        match slot {
            Slot::Item(item) => {
                self.delivered.incr();
                Some(item)
            }
            Slot::Sentinel => None,
        }
    }
}
