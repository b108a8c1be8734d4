//! IIR filter synthesis from analog prototypes.
//!
//! Designs Butterworth, Chebyshev I/II, elliptic and Bessel filters as
//! cascades of second-order sections, through either the bilinear or the
//! matched z-transform. Designed cascades can be run over signals,
//! analyzed in the time and frequency domains, and exported as
//! floating-point or fixed-point coefficient tables.
#![deny(missing_docs)]

extern crate alloc;

/// Trait-first kernel substrate.
pub mod kernel;

/// Signal processing.
pub mod signal;

/// Coefficient export.
pub mod export;

pub use iir_rs_core::{Error, Result};
