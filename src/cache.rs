use std::sync::Arc;

use once_cell::sync::OnceCell;

/// A value computed at most once and shared until explicitly invalidated.
pub struct ResourceCache<T: ?Sized> {
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized> ResourceCache<T> {
    pub fn new() -> Self {
        Self { cell: OnceCell::new() }
    }

    #[cfg(test)]
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Runs `init` only when nothing is cached. A failed `init` leaves the
    /// cache empty so the next call tries again.
    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<Arc<T>, E>,
    {
        self.cell.get_or_try_init(init).cloned()
    }

    pub fn invalidate(&mut self) {
        self.cell.take();
    }
}

impl<T: ?Sized> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
