use core::borrow::Borrow;

use iir_rs_core::complex::IirFloat;
use iir_rs_core::{Error, Result};

use alloc::vec::Vec;

use super::design::Biquad;

/// Transposed direct-form II delay line of one section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionState<F> {
    /// First delay element.
    pub zi0: F,
    /// Second delay element.
    pub zi1: F,
}

impl<F: IirFloat> SectionState<F> {
    /// Zeroed state for `n` sections.
    pub fn zeros(n: usize) -> Vec<Self> {
        alloc::vec![
            SectionState {
                zi0: F::zero(),
                zi1: F::zero()
            };
            n
        ]
    }
}

#[inline(always)]
fn step<F: IirFloat>(s: &Biquad<F>, z: &mut SectionState<F>, x: F) -> F {
    let y = s.b0 * x + z.zi0;
    z.zi0 = s.b1 * x - s.a1 * y + z.zi1;
    z.zi1 = s.b2 * x - s.a2 * y;
    y
}

///
/// Filter `x` through the cascade, carrying `state` across calls.
///
/// `state` must hold one entry per section.
///
#[inline]
pub fn sosfilt_checked_slice<F>(
    x: &[F],
    sections: &[Biquad<F>],
    state: &mut [SectionState<F>],
) -> Result<Vec<F>>
where
    F: IirFloat,
{
    if sections.is_empty() {
        return Err(Error::invalid_arg("sections", "cascade must be non-empty."));
    }
    if state.len() != sections.len() {
        return Err(Error::invalid_arg(
            "state",
            "state must hold one entry per section.",
        ));
    }
    let y = x
        .iter()
        .map(|xi| {
            sections
                .iter()
                .zip(state.iter_mut())
                .fold(*xi, |acc, (s, z)| step(s, z, acc))
        })
        .collect();
    Ok(y)
}

///
/// Cascade filtering for iterator-like inputs.
///
#[inline]
pub fn sosfilt_dyn<YI, F>(
    y: YI,
    sections: &[Biquad<F>],
    state: &mut [SectionState<F>],
) -> Result<Vec<F>>
where
    F: IirFloat,
    YI: IntoIterator,
    YI::Item: Borrow<F>,
{
    let y = y.into_iter().map(|yi| *yi.borrow()).collect::<Vec<F>>();
    sosfilt_checked_slice(&y, sections, state)
}
