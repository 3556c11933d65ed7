//! Index store: an insertion-ordered multimap from string keys to values.
//!
//! The store has two faces:
//! - [`IndexStore`] is the mutable builder used while records are being
//!   collected. It only supports appending.
//! - [`FrozenIndex`] is the read-only snapshot produced by
//!   [`IndexStore::freeze`]. It is shared by reference (`Arc`) between every
//!   decorated record of a run.
//!
//! Values are never deduplicated: emitting the same `(key, value)` pair twice
//! yields two entries.

use indexmap::IndexMap;
use std::sync::Arc;

/// Mutable, append-only key to values multimap.
///
/// # Example
///
/// ```rust
/// use streamdex_core::IndexStore;
///
/// let mut store = IndexStore::new();
/// store.emit("foo", 1);
/// store.emit("foo", 1);
/// store.emit("bar", 1);
///
/// let index = store.freeze();
/// assert_eq!(index.lookup("foo"), Some(vec![1, 1]));
/// assert_eq!(index.lookup("qux"), None);
/// ```
#[derive(Debug, Clone)]
pub struct IndexStore<V> {
    /// Key to values, in first-emission order of the keys.
    entries: IndexMap<String, Vec<V>>,
    /// Total number of emitted values.
    entry_count: usize,
}

impl<V> IndexStore<V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            entry_count: 0,
        }
    }

    /// Appends `value` to the sequence for `key`, creating it if absent.
    pub fn emit(&mut self, key: impl Into<String>, value: V) {
        self.entries.entry(key.into()).or_default().push(value);
        self.entry_count += 1;
    }

    /// Returns the number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the total number of emitted values.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Returns true if nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Freezes the store into a shareable read-only snapshot.
    ///
    /// Consuming `self` guarantees no further `emit` can reach the snapshot.
    pub fn freeze(self) -> FrozenIndex<V> {
        FrozenIndex {
            inner: Arc::new(self),
        }
    }
}

impl<V> Default for IndexStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only snapshot of a completed index.
///
/// Cloning a `FrozenIndex` is cheap and shares the same backing store.
#[derive(Debug)]
pub struct FrozenIndex<V> {
    inner: Arc<IndexStore<V>>,
}

impl<V> Clone for FrozenIndex<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> FrozenIndex<V> {
    /// Returns a copy of the values emitted for `key`, in emission order.
    ///
    /// Returns `None` if the key was never emitted. An emitted key always has
    /// at least one value, so `Some(vec![])` never occurs.
    pub fn lookup(&self, key: &str) -> Option<Vec<V>> {
        self.inner.entries.get(key).cloned()
    }
}

impl<V> FrozenIndex<V> {
    /// Returns a borrowed view of the values for `key`.
    pub fn get(&self, key: &str) -> Option<&[V]> {
        self.inner.entries.get(key).map(Vec::as_slice)
    }

    /// Returns every key with at least one entry, in first-emission order.
    pub fn all_keys(&self) -> Vec<String> {
        self.inner.entries.keys().cloned().collect()
    }

    /// Returns true if `key` has at least one entry.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// Returns the number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.inner.key_count()
    }

    /// Returns the total number of values.
    pub fn entry_count(&self) -> usize {
        self.inner.entry_count()
    }

    /// Returns true if both snapshots share the same backing store.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
