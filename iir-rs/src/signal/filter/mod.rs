/// Digital IIR filter design from analog prototypes.
pub mod design;

/// Time and frequency response analysis of a designed cascade.
pub mod response;

mod kernels;
mod sosfilt;

pub use kernels::*;
pub use sosfilt::*;
