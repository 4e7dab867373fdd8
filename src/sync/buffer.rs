//! Reusable scratch buffers for hot serialization paths.

use super::counter::AtomicCounter;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

const DEFAULT_BUFFER_CAPACITY: usize = 512;
const DEFAULT_MAX_IDLE: usize = 32;

/// A pool of byte buffers that are handed out, used and recycled instead of
/// being reallocated on every call.
///
/// Buffers are cleared before reuse. At most `max_idle` buffers are kept
/// around; extra returns are simply dropped.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
    buffer_capacity: usize,
    max_idle: usize,
    allocated: AtomicCounter,
    reused: AtomicCounter,
}

impl BufferPool {
    /// Creates an empty pool with default sizing.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_IDLE)
    }

    /// Creates an empty pool whose fresh buffers start at `buffer_capacity`
    /// bytes and which keeps at most `max_idle` returned buffers.
    pub fn with_limits(buffer_capacity: usize, max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(max_idle.min(64))),
            buffer_capacity,
            max_idle,
            allocated: AtomicCounter::new(),
            reused: AtomicCounter::new(),
        }
    }

    /// Takes a buffer from the pool, allocating one if none is idle. The
    /// buffer goes back to the pool when the returned guard is dropped.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let recycled = self.idle.lock().pop();
        let buf = match recycled {
            Some(buf) => {
                self.reused.incr();
                buf
            }
            None => {
                self.allocated.incr();
                Vec::with_capacity(self.buffer_capacity)
            }
        };
        PooledBuffer {
            pool: self,
            buf: Some(buf),
        }
    }

    /// Buffers currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Buffers allocated because the pool was empty.
    pub fn allocated(&self) -> u64 {
        self.allocated.get()
    }

    /// Acquisitions served from a recycled buffer.
    pub fn reused(&self) -> u64 {
        self.reused.get()
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<Vec<u8>>,
}

impl PooledBuffer<'_> {
    /// Copies the written bytes out, leaving the buffer to be recycled.
    pub fn to_vec(&self) -> Vec<u8> {
        self.deref().clone()
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        // Only `Drop` takes the buffer out.
        self.buf.as_ref().unwrap_or(&EMPTY)
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.buf.get_or_insert_with(Vec::new)
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

static EMPTY: Vec<u8> = Vec::new();
