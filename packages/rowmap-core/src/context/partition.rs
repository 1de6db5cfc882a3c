//! Copy-on-write record storage for one entity type.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::error::Result;

/// Records of one type behind an atomically swapped snapshot.
///
/// Readers load the current `Arc<Vec<T>>` without locking. Writers are
/// serialized, mutate a clone and publish it with a single swap, so a
/// failed mutation leaves the snapshot untouched.
#[derive(Debug)]
pub(crate) struct Partition<T> {
    rows: ArcSwap<Vec<T>>,
    writer: Mutex<()>,
}

impl<T: Clone> Partition<T> {
    pub(crate) fn new() -> Self {
        Self {
            rows: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot for read access.
    pub(crate) fn load(&self) -> Arc<Vec<T>> {
        self.rows.load_full()
    }

    /// Applies `f` to a copy of the rows and publishes it on success.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        let _guard = self.writer.lock();
        let mut rows = Vec::clone(&self.rows.load());
        let result = f(&mut rows)?;
        self.rows.store(Arc::new(rows));
        Ok(result)
    }

    /// Replaces every row.
    pub(crate) fn replace(&self, rows: Vec<T>) {
        let _guard = self.writer.lock();
        self.rows.store(Arc::new(rows));
    }
}
