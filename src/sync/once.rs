//! Run-exactly-once initialization shared by concurrent callers.

use once_cell::sync::OnceCell;

/// Runs an initializer exactly once no matter how many threads race to call
/// it; every caller gets a reference to the single stored value.
///
/// Callers that arrive while initialization is in progress block until it
/// finishes. A failed fallible initializer stores nothing, so the next caller
/// runs it again.
#[derive(Debug)]
pub struct SingleInitGuard<T> {
    cell: OnceCell<T>,
}

impl<T> Default for SingleInitGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleInitGuard<T> {
    /// Creates an uninitialized guard.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the stored value, running `init` first if nobody has yet.
    pub fn get_or_init<F>(&self, init: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(init)
    }

    /// Fallible variant of [`get_or_init`](Self::get_or_init).
    pub fn get_or_try_init<F, E>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.cell.get_or_try_init(init)
    }

    /// The stored value, if initialization has completed.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether initialization has completed.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Removes and returns the stored value, allowing a fresh initialization.
    pub fn take(&mut self) -> Option<T> {
        self.cell.take()
    }
}
