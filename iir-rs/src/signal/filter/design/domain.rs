//! s-plane to z-plane mapping with a unit sample period.

use iir_rs_core::complex::{is_infinite_root, lit, IirFloat};
use iir_rs_core::{Error, Result};
use nalgebra::Complex;

use super::RootSet;

/// Pre-warp a digital frequency `omega` (rad/sample) to the analog
/// frequency the bilinear transform maps back onto it: `2 tan(omega / 2)`.
pub fn prewarp<F: IirFloat>(omega: F) -> F {
    lit::<F>(2.0) * (omega / lit(2.0)).tan()
}

/// Digital frequency (rad/sample) reached by analog frequency `omega`
/// through the bilinear transform: `2 atan(omega / 2)`.
pub fn unwarp<F: IirFloat>(omega: F) -> F {
    lit::<F>(2.0) * (omega / lit(2.0)).atan()
}

/// Bilinear transform `z = (1 + s/2) / (1 - s/2)`.
///
/// Zeros at infinity land on `z = -1`. A root at `s = 2` has no image and
/// is reported as an error.
pub fn bilinear_transform<F: IirFloat>(set: &RootSet<F>) -> Result<RootSet<F>> {
    let mut singular = false;
    let mapped = set.map(|s| {
        if is_infinite_root(&s) {
            return Complex::new(-F::one(), F::zero());
        }
        let half = s.scale(lit(0.5));
        let one = Complex::new(F::one(), F::zero());
        let den = one - half;
        if den.norm_sqr() == F::zero() {
            singular = true;
            return den;
        }
        (one + half) / den
    });
    if singular {
        return Err(Error::ExecInvariantViolation {
            reason: "root at s = 2 has no bilinear image".into(),
        });
    }
    Ok(mapped)
}

/// Matched z-transform `z = exp(s)`.
///
/// Imaginary parts beyond the angular sample rate (`2 pi` rad/sample) are
/// clamped to it first. Zeros at infinity land on `z = -1`, as in the
/// bilinear case.
///
/// A stop-band zero beyond that bound therefore maps to `z = 1`, which
/// puts a null at DC; normalizing such a low-pass cascade reports
/// [`GainNormalization::Skipped`](super::GainNormalization::Skipped).
pub fn matched_z_transform<F: IirFloat>(set: &RootSet<F>) -> RootSet<F> {
    let limit = F::TAU();
    set.map(|s| {
        if is_infinite_root(&s) {
            return Complex::new(-F::one(), F::zero());
        }
        let im = s.im.max(-limit).min(limit);
        Complex::new(s.re, im).exp()
    })
}
