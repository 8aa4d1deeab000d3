//! Copy-on-write list with non-blocking readers.
//!
//! Devices deliver events from a high-frequency producer that must never wait
//! on a lock held by the control path.  `SnapshotList` gives that producer a
//! consistent view of the attached clients without taking any lock:
//!
//! - **Readers** call [`SnapshotList::snapshot`] and iterate an immutable
//!   `Arc<Vec<T>>`.  Loading it is lock-free.
//! - **Writers** (attach/detach) are serialized by a mutex.  They clone the
//!   current vector, modify the copy, and publish it atomically.  A new entry
//!   is therefore visible only once fully built.
//! - **Reclamation** is deferred: a removed entry stays alive inside every
//!   snapshot that still references it and is dropped when the last in-flight
//!   reader releases its snapshot.

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;

/// A read-only view of a [`SnapshotList`] at the moment it was taken.
pub type Snapshot<T> = Guard<Arc<Vec<T>>>;

/// Copy-on-write list.  See the module docs.
pub struct SnapshotList<T> {
    current: ArcSwap<Vec<T>>,
    writer: Mutex<()>,
}

impl<T: Clone> SnapshotList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Returns the current contents without blocking.
    ///
    /// The snapshot does not observe later inserts or removals.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.current.load()
    }

    /// Appends `item` and publishes the new contents.
    pub fn insert(&self, item: T) {
        let _writer = self.writer.lock();
        let mut next = Vec::with_capacity(self.current.load().len() + 1);
        next.extend(self.current.load().iter().cloned());
        next.push(item);
        self.current.store(Arc::new(next));
    }

    /// Removes the first entry matching `pred` and returns it.
    ///
    /// Readers holding an older snapshot keep seeing the entry until they drop
    /// that snapshot.
    pub fn remove_first<F>(&self, pred: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let _writer = self.writer.lock();
        let current = self.current.load_full();
        let index = current.iter().position(|item| pred(item))?;

        let mut next = Vec::with_capacity(current.len() - 1);
        next.extend(current[..index].iter().cloned());
        next.extend(current[index + 1..].iter().cloned());
        let removed = current[index].clone();
        self.current.store(Arc::new(next));
        Some(removed)
    }

    /// Number of entries in the current contents.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Returns `true` when the current contents are empty.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl<T: Clone> Default for SnapshotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for SnapshotList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.current.load().iter()).finish()
    }
}
