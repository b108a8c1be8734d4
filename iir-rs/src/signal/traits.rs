//! Trait interfaces for signal-processing capabilities.
//!
//! These traits define the trait-first API shape used by the design,
//! filtering and analysis kernels.

use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};

use alloc::vec::Vec;

/// IIR design capability.
pub trait IirDesign<T> {
    /// Output representation produced by the design kernel.
    type Output;

    /// Run IIR design and allocate output representation.
    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation>;

    /// Run IIR design and write the flat `b0, b1, b2, a1, a2` section
    /// coefficients into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;
}

/// 1D cascade filtering capability.
pub trait SosFilt1D<T> {
    /// Run second-order-sections filtering into a caller-provided output buffer.
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run second-order-sections filtering and allocate output.
    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// Frequency/time response analysis capability.
pub trait CascadeAnalysis<T> {
    /// Output representation produced by the analysis kernel.
    type Output;

    /// Analyze and allocate output representation.
    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation>;

    /// Write the log-magnitude gain (dB) into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;
}
