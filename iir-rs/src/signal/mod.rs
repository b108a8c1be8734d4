/// Filter design, cascade filtering and response analysis.
pub mod filter;

/// Capability traits implemented by the kernels.
pub mod traits;
