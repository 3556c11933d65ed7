//! # Streamdex Testkit
//!
//! Test utilities for Streamdex.
//!
//! This crate provides:
//! - Sample record sets and on-disk document fixtures
//! - Helpers that run a transform end to end
//! - Property-based test generators using proptest

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
