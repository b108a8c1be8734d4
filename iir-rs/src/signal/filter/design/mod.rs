//! IIR filter synthesis from analog prototypes.
//!
//! A design runs as a chain of stages, each consuming a [`RootSet`] and
//! returning a new one: normalized analog prototype, frequency transform,
//! s-plane to z-plane mapping, and finally synthesis into a cascade of
//! [`Biquad`] sections with optional gain normalization.
//!
//! [`zplane_design`] skips the analog stages and builds the cascade from
//! pole/zero pairs placed directly in the z-plane.

mod bessel;
mod biquad;
mod domain;
mod elliptic;
mod freq_transform;
mod gain;
mod kernels;
mod placement;
mod prototype;
mod roots;
mod spec;

pub use bessel::*;
pub use biquad::*;
pub use domain::*;
pub use elliptic::{
    arc_elliptic_tan, complete_elliptic_integral, db_to_ratio, elliptic_min_order,
    jacobi_elliptic, modulus_from_period_ratio,
};
pub use freq_transform::*;
pub use gain::*;
pub use kernels::*;
pub use placement::*;
pub use prototype::*;
pub use roots::*;
pub use spec::*;

use alloc::vec::Vec;

use iir_rs_core::complex::IirFloat;
use iir_rs_core::{Error, Result};
use nalgebra::Complex;
use tracing::debug;

/// Largest prototype order accepted by the design kernel.
pub const MAX_ORDER: usize = 32;

/// Filter pass-band type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterBandType {
    /// Low-pass.
    Lowpass,
    /// High-pass.
    Highpass,
    /// Band-pass.
    Bandpass,
    /// Band-stop.
    Bandstop,
}

impl FilterBandType {
    /// Number of band edges the band type needs.
    pub fn edge_count(&self) -> usize {
        match self {
            FilterBandType::Lowpass | FilterBandType::Highpass => 1,
            FilterBandType::Bandpass | FilterBandType::Bandstop => 2,
        }
    }

    /// True when every prototype root yields two digital roots.
    pub fn doubles_order(&self) -> bool {
        self.edge_count() == 2
    }
}

/// Analog approximation family with its ripple/attenuation in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterType<F> {
    /// Maximally flat.
    Butterworth,
    /// Equiripple pass-band.
    ChebyshevI {
        /// Pass-band ripple.
        rp: F,
    },
    /// Equiripple stop-band.
    ChebyshevII {
        /// Stop-band attenuation.
        rs: F,
    },
    /// Equiripple in both bands.
    CauerElliptic {
        /// Pass-band ripple.
        rp: F,
        /// Stop-band attenuation.
        rs: F,
    },
    /// Maximally flat group delay.
    BesselThomson,
}

/// Mapping from the s-plane to the z-plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TranslationMethod {
    /// `z = (1 + s/2) / (1 - s/2)`.
    #[default]
    Bilinear,
    /// `z = exp(s)`.
    MatchedZ,
}

/// A synthesized cascade together with its z-plane roots.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CascadeDesign<F> {
    /// Second-order sections, in evaluation order.
    pub sections: Vec<Biquad<F>>,
    /// Order of the digital filter.
    pub effective_order: usize,
    /// `pole, zero, pole, zero, ...` for plotting.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub pole_zero: Vec<Complex<F>>,
    /// z-plane roots the sections were built from.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub zplane: RootSet<F>,
    /// Gain normalization outcome.
    pub normalization: GainNormalization<F>,
}

impl<F: IirFloat> CascadeDesign<F> {
    /// Number of sections.
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Flat `b0, b1, b2, a1, a2` coefficients, section by section.
    pub fn coefficients(&self) -> Vec<F> {
        self.sections.iter().flat_map(|s| s.coefficients()).collect()
    }

    /// Largest z-plane pole magnitude.
    pub fn max_pole_radius(&self) -> F {
        self.zplane.max_pole_radius()
    }
}

/// Run the full synthesis pipeline for a derived specification.
pub fn iirdesign_dyn<F>(spec: &FilterSpecification<F>) -> Result<CascadeDesign<F>>
where
    F: IirFloat,
{
    let prototype = analog_prototype(spec.order, &spec.ftype)?;
    let prototype = match spec.ftype {
        FilterType::BesselThomson => prototype,
        _ => isolate_real_root(prototype),
    };
    debug!(order = spec.order, ftype = ?spec.ftype, "analog prototype ready");

    let scaled = scale_roots(prototype, spec.bandwidth);
    let analog = match spec.btype {
        FilterBandType::Lowpass => scaled,
        FilterBandType::Highpass => high_pass_transform(scaled),
        FilterBandType::Bandpass | FilterBandType::Bandstop => {
            bandpass_bandstop_transform(scaled, spec.btype, spec.omega_zero)
        }
    };
    debug!(btype = ?spec.btype, roots = analog.len(), "frequency transform applied");

    let zplane = match spec.translation {
        TranslationMethod::Bilinear => bilinear_transform(&analog)?,
        TranslationMethod::MatchedZ => matched_z_transform(&analog),
    };
    if !zplane.is_finite() {
        return Err(Error::ExecInvariantViolation {
            reason: "z-plane roots are not finite".into(),
        });
    }
    debug!(
        translation = ?spec.translation,
        max_pole_radius = ?zplane.max_pole_radius(),
        "domain transform applied"
    );

    let effective_order = spec.effective_order();
    let mut sections = zplane_to_sections(&zplane, effective_order)?;
    let normalization = if spec.normalize_gain {
        normalize_gain(&mut sections, spec.calibration_hz / spec.fs)
    } else {
        GainNormalization::Disabled
    };
    if let Some(section) = sections.iter().position(|s| !s.is_finite()) {
        return Err(Error::NonFiniteCoefficient { section });
    }

    Ok(CascadeDesign {
        sections,
        effective_order,
        pole_zero: zplane.pole_zero_plot(),
        zplane,
        normalization,
    })
}
