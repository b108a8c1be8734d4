use alloc::vec::Vec;

use iir_rs_core::complex::IirFloat;
use nalgebra::Complex;
use tracing::{debug, warn};

use super::Biquad;

/// Outcome of cascade gain normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GainNormalization<F> {
    /// Normalization was not requested.
    Disabled,
    /// Every numerator was rescaled so the cascade has unit gain at
    /// `frequency`.
    Applied {
        /// Cascade magnitude at `frequency` before rescaling.
        original_gain: F,
        /// Calibration frequency as a fraction of the sample rate.
        frequency: F,
    },
    /// A section had zero (or non-finite) gain at `frequency`; the
    /// coefficients are unchanged.
    Skipped {
        /// Calibration frequency as a fraction of the sample rate.
        frequency: F,
    },
}

impl<F> GainNormalization<F> {
    /// True when normalization was requested but had to be skipped.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, GainNormalization::Skipped { .. })
    }
}

/// `z^-1` on the unit circle at `frequency` (cycles per sample).
pub fn unit_circle_z_inv<F: IirFloat>(frequency: F) -> Complex<F> {
    Complex::from_polar(F::one(), -F::TAU() * frequency)
}

/// Rescale each section so the cascade has unit magnitude at `frequency`
/// (a fraction of the sample rate, `0..=0.5`).
///
/// Each section is normalized on its own; `original_gain` is the product
/// of the per-section magnitudes.
pub fn normalize_gain<F: IirFloat>(sections: &mut [Biquad<F>], frequency: F) -> GainNormalization<F> {
    let z_inv = unit_circle_z_inv(frequency);
    let mut gains = Vec::with_capacity(sections.len());
    for (i, s) in sections.iter().enumerate() {
        let g = s.response(z_inv).norm();
        if !g.is_finite() || g <= F::epsilon() {
            warn!(section = i, ?frequency, "zero gain at calibration frequency, normalization skipped");
            return GainNormalization::Skipped { frequency };
        }
        gains.push(g);
    }

    let mut original_gain = F::one();
    for (s, g) in sections.iter_mut().zip(gains) {
        s.scale_numerator(F::one() / g);
        original_gain = original_gain * g;
    }
    debug!(?frequency, ?original_gain, "normalized cascade gain");
    GainNormalization::Applied {
        original_gain,
        frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::filter::response::cascade_response_at;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn lowpass_pair() -> [Biquad<f64>; 2] {
        [
            Biquad {
                b0: 1.0,
                b1: 2.0,
                b2: 1.0,
                a1: -0.9,
                a2: 0.3,
            },
            Biquad {
                b0: 1.0,
                b1: 1.0,
                b2: 0.0,
                a1: -0.4,
                a2: 0.0,
            },
        ]
    }

    #[test]
    fn normalizes_to_unity_at_dc() {
        let mut sections = lowpass_pair();
        let before = cascade_response_at(&sections, 0.0).norm();
        let status = normalize_gain(&mut sections, 0.0);
        match status {
            GainNormalization::Applied { original_gain, .. } => {
                assert_relative_eq!(original_gain, before, max_relative = 1e-12)
            }
            other => panic!("expected applied normalization, got {other:?}"),
        }
        assert_abs_diff_eq!(cascade_response_at(&sections, 0.0).norm(), 1.0, epsilon = 1e-12);
        for s in &sections {
            assert_abs_diff_eq!(s.response(Complex::new(1.0, 0.0)).norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn skips_when_a_zero_sits_on_the_calibration_frequency() {
        // zeros at z = -1 kill the Nyquist response
        let mut sections = lowpass_pair();
        let untouched = sections;
        let status = normalize_gain(&mut sections, 0.5);
        assert_eq!(status, GainNormalization::Skipped { frequency: 0.5 });
        assert!(status.is_degenerate());
        assert_eq!(sections, untouched);
    }
}
