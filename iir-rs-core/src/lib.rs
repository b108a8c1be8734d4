//! Shared types for `iir-rs`.

#![deny(missing_docs)]

pub mod complex;
mod error;

pub use error::*;

/// Result type returned by the synthesis routines.
pub type Result<T> = core::result::Result<T, Error>;
