//! Extraction callback protocol.
//!
//! Each record handed to an [`Indexer`] comes with its own [`Emitter`].
//! The emitter writes into the single store shared by the whole run and
//! must be finished exactly once, with [`Emitter::done`] on success or
//! [`Emitter::fail`] / [`Emitter::reject`] on failure. Finishing consumes
//! the emitter, so nothing can be emitted for a record after it is done.
//!
//! Emitters are `Send`: a callback may hand its emitter to another thread
//! or task and finish it later. The transform waits for every outstanding
//! emitter before it freezes the store.
//!
//! Dropping an emitter without finishing it is reported as
//! [`IndexError::CallbackAbandoned`].

use crate::error::IndexError;
use crate::stats::TransformStats;
use crate::store::IndexStore;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Instant;

/// Caller-supplied extraction function.
///
/// Implemented for every `Fn(&R, Emitter<V>) + Send + Sync`.
///
/// # Example
///
/// ```rust
/// use streamdex_core::{Emitter, FileRecord, Indexer};
///
/// fn index_words(record: &FileRecord, mut emitter: Emitter<u32>) {
///     for word in record.text().split_whitespace() {
///         emitter.emit(word, 1);
///     }
///     emitter.done();
/// }
///
/// fn assert_indexer<I: Indexer<FileRecord, u32>>(_: &I) {}
/// assert_indexer(&index_words);
/// ```
pub trait Indexer<R, V>: Send + Sync {
    /// Extracts entries from `record` through `emitter`.
    fn index(&self, record: &R, emitter: Emitter<V>);
}

impl<R, V, F> Indexer<R, V> for F
where
    F: Fn(&R, Emitter<V>) + Send + Sync,
{
    fn index(&self, record: &R, emitter: Emitter<V>) {
        self(record, emitter)
    }
}

/// Mutable state shared between the transform and its emitters.
#[derive(Debug)]
pub(crate) struct Collector<V> {
    /// The store; `None` once frozen or torn down.
    pub(crate) store: Option<IndexStore<V>>,
    /// Callbacks dispatched but not yet finished.
    pub(crate) in_flight: usize,
    /// First failure reported by any callback.
    pub(crate) failure: Option<IndexError>,
    /// Counters.
    pub(crate) stats: TransformStats,
}

/// Collector plus the condition signalled whenever a callback finishes.
#[derive(Debug)]
pub(crate) struct Shared<V> {
    collector: Mutex<Collector<V>>,
    settled: Condvar,
}

impl<V> Shared<V> {
    pub(crate) fn new() -> Self {
        Self {
            collector: Mutex::new(Collector {
                store: Some(IndexStore::new()),
                in_flight: 0,
                failure: None,
                stats: TransformStats::default(),
            }),
            settled: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Collector<V>> {
        self.collector.lock()
    }

    /// Waits while `pending` holds, until a callback fails or `deadline` passes.
    ///
    /// Returns false on timeout.
    pub(crate) fn wait_while(
        &self,
        guard: &mut MutexGuard<'_, Collector<V>>,
        deadline: Option<Instant>,
        mut pending: impl FnMut(&Collector<V>) -> bool,
    ) -> bool {
        while pending(&**guard) && guard.failure.is_none() {
            match deadline {
                Some(deadline) => {
                    if self.settled.wait_until(guard, deadline).timed_out() {
                        return !pending(&**guard) || guard.failure.is_some();
                    }
                }
                None => self.settled.wait(guard),
            }
        }
        true
    }
}

/// Per-record handle for contributing entries to the index.
pub struct Emitter<V> {
    shared: Arc<Shared<V>>,
    index: Arc<str>,
    record: String,
    emitted: usize,
    finished: bool,
}

impl<V> Emitter<V> {
    pub(crate) fn new(shared: Arc<Shared<V>>, index: Arc<str>, record: String) -> Self {
        Self {
            shared,
            index,
            record,
            emitted: 0,
            finished: false,
        }
    }

    /// Appends `value` under `key` in the shared index.
    ///
    /// If the run has already been torn down (aborted or failed), the entry
    /// is discarded.
    pub fn emit(&mut self, key: impl Into<String>, value: V) {
        let mut guard = self.shared.lock();
        let collector = &mut *guard;
        match collector.store.as_mut() {
            Some(store) => {
                store.emit(key, value);
                collector.stats.entries_emitted += 1;
                self.emitted += 1;
            }
            None => {
                tracing::warn!(
                    index = %self.index,
                    record = %self.record,
                    "discarding entry emitted after the run was torn down"
                );
            }
        }
    }

    /// Returns the identity of the record being indexed.
    pub fn record(&self) -> &str {
        &self.record
    }

    /// Returns the number of entries emitted through this handle.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Signals that the record has been fully indexed.
    pub fn done(mut self) {
        self.finish(None);
    }

    /// Reports a callback failure; the run will fail with
    /// [`IndexError::Callback`].
    pub fn fail(mut self, message: impl Into<String>) {
        let error = IndexError::Callback {
            index: self.index.to_string(),
            record: self.record.clone(),
            message: message.into(),
        };
        self.finish(Some(error));
    }

    /// Reports a structured failure, e.g. [`IndexError::MalformedRecord`].
    pub fn reject(mut self, error: IndexError) {
        self.finish(Some(error));
    }

    fn finish(&mut self, failure: Option<IndexError>) {
        self.finished = true;
        let mut collector = self.shared.lock();
        collector.in_flight = collector.in_flight.saturating_sub(1);
        match failure {
            None => {
                collector.stats.records_indexed += 1;
                tracing::debug!(
                    index = %self.index,
                    record = %self.record,
                    entries = self.emitted,
                    "record indexed"
                );
            }
            Some(error) => {
                tracing::debug!(index = %self.index, record = %self.record, %error, "indexer failed");
                if collector.failure.is_none() {
                    collector.failure = Some(error);
                }
            }
        }
        drop(collector);
        self.shared.settled.notify_all();
    }
}

impl<V> Drop for Emitter<V> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                index = %self.index,
                record = %self.record,
                "emitter dropped without done"
            );
            let error = IndexError::CallbackAbandoned {
                index: self.index.to_string(),
                record: self.record.clone(),
            };
            self.finish(Some(error));
        }
    }
}

impl<V> std::fmt::Debug for Emitter<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("index", &self.index)
            .field("record", &self.record)
            .field("emitted", &self.emitted)
            .finish()
    }
}
