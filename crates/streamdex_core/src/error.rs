//! Error types for the streaming indexer.

use std::io;
use thiserror::Error;

/// Result type for indexing operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while building or exposing an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index name cannot be turned into method names.
    #[error("invalid index name {name:?}: {reason}")]
    InvalidIndexName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Extraction callback reported a failure instead of completing.
    #[error("indexer for {index:?} failed on {record}: {message}")]
    Callback {
        /// Index being built.
        index: String,
        /// Identity of the record being processed.
        record: String,
        /// Failure reported by the callback.
        message: String,
    },

    /// Record is missing data the extraction callback requires.
    #[error("malformed record {record}: {message}")]
    MalformedRecord {
        /// Identity of the record.
        record: String,
        /// What is missing or wrong.
        message: String,
    },

    /// Extraction callback dropped its emitter without signalling completion.
    #[error("indexer for {index:?} abandoned {record} without calling done")]
    CallbackAbandoned {
        /// Index being built.
        index: String,
        /// Identity of the record being processed.
        record: String,
    },

    /// A generated facade name is already attached to the record.
    #[error("facade name {name:?} already attached to {record}")]
    NameCollision {
        /// The colliding method name.
        name: String,
        /// Identity of the record.
        record: String,
    },

    /// Operation not permitted in the current transform state.
    #[error("cannot {operation} while transform is {state}")]
    InvalidState {
        /// Current state.
        state: String,
        /// Attempted operation.
        operation: String,
    },

    /// Host pipeline aborted the run.
    #[error("run aborted: {reason}")]
    Aborted {
        /// Reason given by the host.
        reason: String,
    },

    /// Downstream consumer refused a decorated record.
    #[error("downstream consumer failed: {message}")]
    Downstream {
        /// Failure reported by the consumer.
        message: String,
    },

    /// Waiting for outstanding callbacks timed out.
    #[error("timed out waiting for {outstanding} outstanding indexer callback(s)")]
    Timeout {
        /// Callbacks that had not completed.
        outstanding: usize,
    },

    /// The holding buffer reached its configured limit.
    #[error("holding buffer full: limit is {limit} record(s)")]
    BufferFull {
        /// Configured limit.
        limit: usize,
    },

    /// The pipeline stage is no longer accepting input.
    #[error("pipeline stage is closed")]
    StageClosed,

    /// Failed facade call on a decorated record.
    #[error("record has no facade named {name:?}")]
    UnknownFacade {
        /// Requested facade name.
        name: String,
    },

    /// I/O error from a record source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IndexError {
    /// Creates an invalid index name error.
    pub fn invalid_index_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIndexName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed record error.
    pub fn malformed_record(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(state: impl std::fmt::Display, operation: impl Into<String>) -> Self {
        Self::InvalidState {
            state: state.to_string(),
            operation: operation.into(),
        }
    }

    /// Creates an aborted error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Creates a downstream failure error.
    pub fn downstream(message: impl Into<String>) -> Self {
        Self::Downstream {
            message: message.into(),
        }
    }

    /// Returns true if the error originated in an extraction callback.
    pub fn is_callback_error(&self) -> bool {
        matches!(
            self,
            IndexError::Callback { .. }
                | IndexError::MalformedRecord { .. }
                | IndexError::CallbackAbandoned { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_errors_are_classified() {
        assert!(IndexError::malformed_record("a.md", "no keywords").is_callback_error());
        assert!(IndexError::CallbackAbandoned {
            index: "fullText".into(),
            record: "a.md".into(),
        }
        .is_callback_error());
        assert!(!IndexError::aborted("host").is_callback_error());
        assert!(!IndexError::StageClosed.is_callback_error());
    }

    #[test]
    fn error_display() {
        let err = IndexError::Callback {
            index: "keywords".into(),
            record: "doc.md".into(),
            message: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "indexer for \"keywords\" failed on doc.md: boom"
        );

        let err = IndexError::invalid_state("COMPLETE", "push");
        assert_eq!(err.to_string(), "cannot push while transform is COMPLETE");

        let err = IndexError::Timeout { outstanding: 2 };
        assert!(err.to_string().contains('2'));
    }
}
