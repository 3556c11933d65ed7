//! Two-phase indexing transform.
//!
//! ```text
//! COLLECTING ──end of input──▶ EXHAUSTED ──▶ DECORATING ──▶ COMPLETE
//!      │                                         │
//!      └──────────── failure / abort ────────────┴──▶ ERRORED
//! ```
//!
//! While collecting, every record is handed to the indexer and held in
//! arrival order. Nothing is released until input ends and every
//! outstanding callback has finished: only then is the index complete, so
//! only then can a record's facade answer for entries contributed by later
//! records. The store is then frozen and the held records are released,
//! each decorated with the same shared [`LookupFacade`].
//!
//! # Example
//!
//! ```rust
//! use streamdex_core::{build_index, Emitter, FileRecord};
//!
//! let mut transform = build_index("fullText", |record: &FileRecord, mut emitter: Emitter<u32>| {
//!     for word in record.text().split_whitespace() {
//!         emitter.emit(word, 1);
//!     }
//!     emitter.done();
//! })?;
//!
//! transform.push(FileRecord::new("a.md", "foo foo bar"))?;
//! transform.push(FileRecord::new("b.md", "foo baz"))?;
//!
//! for decorated in transform.finish()? {
//!     let decorated = decorated?;
//!     assert_eq!(decorated.lookup("lookupFullText", "foo")?, Some(vec![1, 1, 1]));
//! }
//! # Ok::<(), streamdex_core::IndexError>(())
//! ```

use crate::config::TransformConfig;
use crate::emitter::{Emitter, Indexer, Shared};
use crate::error::{IndexError, IndexResult};
use crate::facade::{Decorated, FacadeNames, LookupFacade};
use crate::record::Record;
use crate::stage::RecordSink;
use crate::stats::TransformStats;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle state of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    /// Receiving records and populating the index.
    Collecting,
    /// Input ended; waiting for outstanding callbacks.
    Exhausted,
    /// Releasing held records with facades attached.
    Decorating,
    /// Every record has been released.
    Complete,
    /// The run failed or was aborted.
    Errored,
}

impl TransformState {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransformState::Complete | TransformState::Errored)
    }
}

impl fmt::Display for TransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformState::Collecting => "COLLECTING",
            TransformState::Exhausted => "EXHAUSTED",
            TransformState::Decorating => "DECORATING",
            TransformState::Complete => "COMPLETE",
            TransformState::Errored => "ERRORED",
        };
        f.write_str(name)
    }
}

/// Creates an indexing transform with the default configuration.
///
/// `index_name` determines the facade names: `lookup<Name>` and
/// `allIndexed<Name>`.
pub fn build_index<R, V, I>(index_name: &str, indexer: I) -> IndexResult<IndexTransform<R, V>>
where
    R: Record,
    V: Clone + Send + Sync + 'static,
    I: Indexer<R, V> + 'static,
{
    IndexTransform::new(index_name, indexer)
}

/// Pipeline stage that indexes records and releases them decorated.
pub struct IndexTransform<R, V> {
    index_name: Arc<str>,
    names: FacadeNames,
    indexer: Box<dyn Indexer<R, V>>,
    config: TransformConfig,
    shared: Arc<Shared<V>>,
    buffer: Vec<R>,
    state: TransformState,
}

impl<R, V> IndexTransform<R, V>
where
    R: Record,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a transform with the default configuration.
    pub fn new<I>(index_name: &str, indexer: I) -> IndexResult<Self>
    where
        I: Indexer<R, V> + 'static,
    {
        Self::with_config(index_name, indexer, TransformConfig::default())
    }

    /// Creates a transform with an explicit configuration.
    pub fn with_config<I>(index_name: &str, indexer: I, config: TransformConfig) -> IndexResult<Self>
    where
        I: Indexer<R, V> + 'static,
    {
        let names = FacadeNames::derive(index_name)?;
        tracing::debug!(
            index = index_name,
            lookup = %names.lookup,
            all_keys = %names.all_keys,
            "index transform created"
        );

        Ok(Self {
            index_name: Arc::from(index_name),
            names,
            indexer: Box::new(indexer),
            config,
            shared: Arc::new(Shared::new()),
            buffer: Vec::new(),
            state: TransformState::Collecting,
        })
    }

    /// Returns the index name.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Returns the generated facade names.
    pub fn names(&self) -> &FacadeNames {
        &self.names
    }

    /// Returns the current state.
    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Returns the run's counters.
    pub fn stats(&self) -> TransformStats {
        self.shared.lock().stats
    }

    /// Returns the number of records held for decoration.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Accepts one record: dispatches the indexer and holds the record.
    ///
    /// Waits for a free callback slot first (see
    /// [`TransformConfig::max_in_flight`]). A failure reported by any
    /// callback so far fails the run and is returned here.
    pub fn push(&mut self, record: R) -> IndexResult<()> {
        self.ensure_collecting("push")?;

        if let Some(limit) = self.config.max_buffered {
            if self.buffer.len() >= limit {
                return Err(self.fail_with(IndexError::BufferFull { limit }));
            }
        }

        let limit = self.config.in_flight_limit();
        let deadline = self.deadline();
        let mut collector = self.shared.lock();
        let settled = self
            .shared
            .wait_while(&mut collector, deadline, |c| c.in_flight >= limit);
        if let Some(error) = collector.failure.take() {
            drop(collector);
            return Err(self.fail_with(error));
        }
        if !settled {
            let outstanding = collector.in_flight;
            drop(collector);
            return Err(self.fail_with(IndexError::Timeout { outstanding }));
        }
        collector.in_flight += 1;
        collector.stats.records_received += 1;
        drop(collector);

        let identity = record.identity();
        tracing::debug!(index = %self.index_name, record = %identity, "record received");
        let emitter = Emitter::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.index_name),
            identity,
        );
        self.indexer.index(&record, emitter);
        self.buffer.push(record);

        let failure = self.shared.lock().failure.take();
        match failure {
            Some(error) => Err(self.fail_with(error)),
            None => Ok(()),
        }
    }

    /// Signals end of input.
    ///
    /// Waits for every outstanding callback, freezes the index and returns
    /// the held records as an ordered iterator of decorated records.
    pub fn finish(mut self) -> IndexResult<Decorations<R, V>> {
        self.ensure_collecting("finish")?;
        self.state = TransformState::Exhausted;
        tracing::info!(
            index = %self.index_name,
            records = self.buffer.len(),
            "input exhausted, waiting for indexers"
        );

        let deadline = self.deadline();
        let mut collector = self.shared.lock();
        let settled = self
            .shared
            .wait_while(&mut collector, deadline, |c| c.in_flight > 0);
        if let Some(error) = collector.failure.take() {
            drop(collector);
            return Err(self.fail_with(error));
        }
        if !settled {
            let outstanding = collector.in_flight;
            drop(collector);
            return Err(self.fail_with(IndexError::Timeout { outstanding }));
        }
        let store = collector.store.take();
        drop(collector);

        let Some(store) = store else {
            return Err(self.fail_with(IndexError::invalid_state(self.state, "freeze index")));
        };
        let index = store.freeze();
        tracing::info!(
            index = %self.index_name,
            keys = index.key_count(),
            entries = index.entry_count(),
            "index frozen, decorating records"
        );

        let facade = Arc::new(LookupFacade::new(
            self.index_name.to_string(),
            self.names.clone(),
            index,
        ));
        self.state = TransformState::Decorating;

        Ok(Decorations {
            index_name: Arc::clone(&self.index_name),
            records: std::mem::take(&mut self.buffer).into_iter(),
            facade,
            shared: Arc::clone(&self.shared),
            state: TransformState::Decorating,
        })
    }

    /// Signals end of input and delivers every decorated record to `sink`.
    ///
    /// Any failure is reported to the sink through [`RecordSink::error`]
    /// and returned; remaining records are discarded.
    pub fn finish_into<S>(self, sink: &mut S) -> IndexResult<TransformStats>
    where
        S: RecordSink<Decorated<R, V>> + ?Sized,
    {
        let mut decorations = match self.finish() {
            Ok(decorations) => decorations,
            Err(error) => {
                sink.error(&error);
                return Err(error);
            }
        };

        while let Some(item) = decorations.next() {
            if let Err(error) = item.and_then(|decorated| sink.push(decorated)) {
                sink.error(&error);
                return Err(decorations.abandon(error));
            }
        }

        sink.end()?;
        Ok(decorations.stats())
    }

    /// Tears the run down on behalf of the host pipeline.
    ///
    /// Held records and the index are discarded. Returns the error to
    /// propagate downstream.
    pub fn abort(&mut self, reason: impl Into<String>) -> IndexError {
        let error = IndexError::aborted(reason);
        if self.state.is_terminal() {
            return error;
        }
        self.fail_with(error)
    }

    fn ensure_collecting(&self, operation: &str) -> IndexResult<()> {
        if self.state == TransformState::Collecting {
            Ok(())
        } else {
            Err(IndexError::invalid_state(self.state, operation))
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.config
            .completion_timeout
            .map(|timeout| Instant::now() + timeout)
    }

    fn fail_with(&mut self, error: IndexError) -> IndexError {
        tracing::warn!(
            index = %self.index_name,
            state = %self.state,
            discarded = self.buffer.len(),
            %error,
            "indexing run failed"
        );
        self.state = TransformState::Errored;
        self.buffer.clear();
        self.shared.lock().store = None;
        error
    }
}

impl<R, V> fmt::Debug for IndexTransform<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexTransform")
            .field("index_name", &self.index_name)
            .field("names", &self.names)
            .field("config", &self.config)
            .field("buffered", &self.buffer.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Ordered release of decorated records after input has ended.
///
/// Yields one decorated record per received record, in arrival order.
/// After an error is yielded the iterator is exhausted.
pub struct Decorations<R, V> {
    index_name: Arc<str>,
    records: std::vec::IntoIter<R>,
    facade: Arc<LookupFacade<V>>,
    shared: Arc<Shared<V>>,
    state: TransformState,
}

impl<R, V> Decorations<R, V> {
    /// Returns the facade shared by every decorated record.
    pub fn facade(&self) -> &Arc<LookupFacade<V>> {
        &self.facade
    }

    /// Returns the current state (`Decorating`, `Complete` or `Errored`).
    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Returns the number of records not yet released.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    /// Returns the run's counters.
    pub fn stats(&self) -> TransformStats {
        self.shared.lock().stats
    }

    /// Stops decoration after a downstream failure, discarding the rest.
    pub fn abandon(&mut self, error: IndexError) -> IndexError {
        if self.state == TransformState::Decorating {
            tracing::warn!(
                index = %self.index_name,
                discarded = self.records.len(),
                %error,
                "decoration abandoned"
            );
            self.state = TransformState::Errored;
            self.records = Vec::new().into_iter();
        }
        error
    }
}

impl<R: Record, V: Send + Sync + 'static> Iterator for Decorations<R, V> {
    type Item = IndexResult<Decorated<R, V>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != TransformState::Decorating {
            return None;
        }

        let Some(record) = self.records.next() else {
            self.state = TransformState::Complete;
            tracing::info!(
                index = %self.index_name,
                decorated = self.shared.lock().stats.records_decorated,
                "indexing run complete"
            );
            return None;
        };

        match Decorated::wrap(record, &self.facade) {
            Ok(decorated) => {
                self.shared.lock().stats.records_decorated += 1;
                Some(Ok(decorated))
            }
            Err(error) => Some(Err(self.abandon(error))),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            TransformState::Decorating => (0, Some(self.records.len())),
            _ => (0, Some(0)),
        }
    }
}

impl<R: Record, V: Send + Sync + 'static> FusedIterator for Decorations<R, V> {}

impl<R, V> fmt::Debug for Decorations<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorations")
            .field("index_name", &self.index_name)
            .field("remaining", &self.records.len())
            .field("state", &self.state)
            .finish()
    }
}
