//! # Streamdex Core
//!
//! Two-phase streaming indexer.
//!
//! Records pass through an [`IndexTransform`] while a caller-supplied
//! [`Indexer`] contributes key → value entries into a named index. Once
//! input has ended and every indexer callback has finished, the index is
//! frozen and each record is released with lookup facades for it attached.
//!
//! This crate provides:
//! - [`IndexStore`] / [`FrozenIndex`]: insertion-ordered multimap and its
//!   read-only snapshot
//! - [`Emitter`] / [`Indexer`]: the extraction callback protocol
//! - [`IndexTransform`]: the collect-then-decorate state machine
//! - [`LookupFacade`] / [`Decorated`]: capabilities attached to output records
//! - [`stage`]: a threaded pipeline stage with bounded channels
//! - [`extract`]: sample full-text and keyword indexers
//!
//! ## Key Invariants
//!
//! - No record is released before every record has been indexed
//! - Records are released in arrival order, each exactly once
//! - Every released record shares one frozen snapshot of the index
//! - A failed run releases nothing

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod emitter;
mod error;
mod facade;
mod record;
mod stats;
mod store;
mod transform;

pub mod extract;
pub mod stage;

pub use config::TransformConfig;
pub use emitter::{Emitter, Indexer};
pub use error::{IndexError, IndexResult};
pub use facade::{Capability, Decorated, FacadeNames, LookupFacade, ALL_KEYS_PREFIX, LOOKUP_PREFIX};
pub use record::{FileRecord, Record};
pub use stage::{RecordSink, StageHandle};
pub use stats::TransformStats;
pub use store::{FrozenIndex, IndexStore};
pub use transform::{build_index, Decorations, IndexTransform, TransformState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
