//! Shared/exclusive lock used to guard cache shards and the reference store.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// A reader/writer lock: any number of concurrent readers or one writer.
///
/// Backed by `parking_lot::RwLock`, whose eventual-fairness policy hands the
/// lock to a queued writer before letting newly arriving readers in, so a
/// steady stream of readers cannot starve a writer. The lock is not poisoned
/// by a panicking holder.
#[derive(Debug, Default)]
pub struct SharedExclusiveLock<T> {
    inner: RwLock<T>,
}

impl<T> SharedExclusiveLock<T> {
    /// Wraps `value` in a new unlocked lock.
    pub const fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Acquires shared access, blocking while a writer holds the lock.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Acquires exclusive access, blocking until all readers have left.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// Attempts shared access without blocking.
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
        self.inner.try_read()
    }

    /// Attempts exclusive access without blocking.
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.inner.try_write()
    }

    /// Attempts exclusive access, giving up after `timeout`.
    pub fn try_write_for(&self, timeout: Duration) -> Option<RwLockWriteGuard<'_, T>> {
        self.inner.try_write_for(timeout)
    }

    /// Consumes the lock and returns the protected value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
