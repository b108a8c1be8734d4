//! Direct z-plane design from hand-placed pole/zero pairs.
//!
//! Each pair becomes one second-order section: the pole and zero are
//! placed with their conjugates, so the coefficients stay real.

use alloc::vec::Vec;

use iir_rs_core::complex::{from_polar, lit, IirFloat, Polar};
use iir_rs_core::Error;
use tracing::debug;

use crate::kernel::{
    output_of_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D,
};
use crate::signal::traits::IirDesign;

use super::{normalize_gain, zplane_to_sections, CascadeDesign, GainNormalization, RootSet};

/// Largest number of pole/zero pairs the placement kernel accepts.
pub const MAX_PLACED_PAIRS: usize = 5;

/// A z-plane position with its angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacedRoot<F> {
    /// Distance from the origin.
    pub magnitude: F,
    /// Angle in degrees; `180` is Nyquist.
    pub angle_degrees: F,
}

impl<F: IirFloat> PlacedRoot<F> {
    /// Root at `magnitude` and `angle_degrees`.
    pub fn new(magnitude: F, angle_degrees: F) -> Self {
        Self {
            magnitude,
            angle_degrees,
        }
    }

    /// Polar form with the angle in radians.
    pub fn polar(&self) -> Polar<F> {
        Polar {
            magnitude: self.magnitude,
            angle: self.angle_degrees.to_radians(),
        }
    }

    fn is_finite(&self) -> bool {
        self.magnitude.is_finite() && self.angle_degrees.is_finite()
    }
}

/// One pole and one zero; both conjugates are added on design.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacedPair<F> {
    /// Pole position; the magnitude must be below 1.
    pub pole: PlacedRoot<F>,
    /// Zero position.
    pub zero: PlacedRoot<F>,
}

/// Build a cascade from `(pole, zero)` pairs given in polar form.
///
/// The cascade has one section per pair and order `2 * pairs.len()`.
/// When `normalize_at` is set (a fraction of the sample rate), the gain at
/// that frequency is normalized to one.
pub fn zplane_design<F: IirFloat>(
    pairs: &[(Polar<F>, Polar<F>)],
    normalize_at: Option<F>,
) -> iir_rs_core::Result<CascadeDesign<F>> {
    if pairs.is_empty() {
        return Err(Error::invalid_arg(
            "pairs",
            "at least one pole/zero pair is required",
        ));
    }
    if pairs
        .iter()
        .any(|(pole, _)| !pole.magnitude.is_finite() || pole.magnitude >= F::one())
    {
        return Err(Error::invalid_arg("pole", "pole magnitude must be below 1"));
    }

    let mut poles = Vec::with_capacity(2 * pairs.len());
    let mut zeros = Vec::with_capacity(2 * pairs.len());
    for (pole, zero) in pairs {
        let p = from_polar(*pole);
        let z = from_polar(*zero);
        poles.extend([p, p.conj()]);
        zeros.extend([z, z.conj()]);
    }
    let zplane = RootSet { poles, zeros };

    let effective_order = zplane.len();
    let mut sections = zplane_to_sections(&zplane, effective_order)?;
    let normalization = match normalize_at {
        Some(frequency) => normalize_gain(&mut sections, frequency),
        None => GainNormalization::Disabled,
    };
    debug!(pairs = pairs.len(), ?normalization, "placed z-plane design");

    Ok(CascadeDesign {
        sections,
        effective_order,
        pole_zero: zplane.pole_zero_plot(),
        zplane,
        normalization,
    })
}

/// Constructor config for [`PoleZeroPlacementKernel`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoleZeroPlacementConfig<F> {
    /// Pole/zero pairs, one section each.
    pub pairs: Vec<PlacedPair<F>>,
    /// Optional gain normalization frequency as a fraction of the sample
    /// rate, `0..=0.5` (default none).
    #[cfg_attr(feature = "serde", serde(default))]
    pub normalize_at: Option<F>,
}

/// Trait-first pole-zero placement kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct PoleZeroPlacementKernel<F> {
    pairs: Vec<(Polar<F>, Polar<F>)>,
    normalize_at: Option<F>,
}

impl<F: IirFloat> PoleZeroPlacementKernel<F> {
    /// Number of sections [`IirDesign::run_into`] writes.
    pub fn num_sections(&self) -> usize {
        self.pairs.len()
    }
}

impl<F> KernelLifecycle for PoleZeroPlacementKernel<F>
where
    F: IirFloat,
{
    type Config = PoleZeroPlacementConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.pairs.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "pairs" });
        }
        if config.pairs.len() > MAX_PLACED_PAIRS {
            return Err(ConfigError::InvalidArgument {
                arg: "pairs",
                reason: "at most five pole/zero pairs can be placed",
            });
        }
        for pair in &config.pairs {
            if !pair.pole.is_finite() || !pair.zero.is_finite() {
                return Err(ConfigError::InvalidArgument {
                    arg: "pairs",
                    reason: "pole and zero positions must be finite",
                });
            }
            if pair.pole.magnitude < F::zero() || pair.zero.magnitude < F::zero() {
                return Err(ConfigError::InvalidArgument {
                    arg: "pairs",
                    reason: "magnitudes must be non-negative",
                });
            }
            if pair.pole.magnitude >= F::one() {
                return Err(ConfigError::InvalidArgument {
                    arg: "pole",
                    reason: "pole magnitude must be below 1",
                });
            }
        }
        if let Some(frequency) = config.normalize_at {
            if !(F::zero()..=lit(0.5)).contains(&frequency) {
                return Err(ConfigError::InvalidArgument {
                    arg: "normalize_at",
                    reason: "normalization frequency must lie in 0..=0.5",
                });
            }
        }

        let pairs: Vec<_> = config
            .pairs
            .iter()
            .map(|pair| (pair.pole.polar(), pair.zero.polar()))
            .collect();
        debug!(pairs = pairs.len(), "placement kernel ready");
        Ok(Self {
            pairs,
            normalize_at: config.normalize_at,
        })
    }
}

impl<F> IirDesign<F> for PoleZeroPlacementKernel<F>
where
    F: IirFloat,
{
    type Output = CascadeDesign<F>;

    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation> {
        Ok(zplane_design(&self.pairs, self.normalize_at)?)
    }

    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<F> + ?Sized,
    {
        let out_slice = output_of_len(out, 5 * self.pairs.len())?;
        let design = zplane_design(&self.pairs, self.normalize_at)?;
        for (chunk, section) in out_slice.chunks_exact_mut(5).zip(design.sections.iter()) {
            chunk.copy_from_slice(&section.coefficients());
        }
        Ok(())
    }
}
