//! Transform statistics.
//!
//! Counters track arrival, indexing and release of records so callers can
//! observe progress of a run without touching the buffered records.

use std::fmt;

/// Counters for one indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Records accepted while collecting.
    pub records_received: u64,
    /// Records whose indexer called `done`.
    pub records_indexed: u64,
    /// Entries emitted into the index.
    pub entries_emitted: u64,
    /// Records released with facades attached.
    pub records_decorated: u64,
}

impl TransformStats {
    /// Returns the number of records received but not yet indexed.
    pub fn pending(&self) -> u64 {
        self.records_received.saturating_sub(self.records_indexed)
    }
}

impl fmt::Display for TransformStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received: {}, indexed: {}, entries: {}, decorated: {}",
            self.records_received,
            self.records_indexed,
            self.entries_emitted,
            self.records_decorated,
        )
    }
}
