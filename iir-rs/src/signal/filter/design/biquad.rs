use alloc::vec::Vec;

use iir_rs_core::complex::{lit, to_polar, IirFloat};
use iir_rs_core::{Error, Result};
use nalgebra::Complex;
use tracing::debug;

use super::RootSet;

/// One second-order section with an implicit unity `a0`.
///
/// The transfer function is
/// `(b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`; first-order
/// sections have `b2 = a2 = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Biquad<F> {
    /// Feed-forward coefficient on `x[n]`.
    pub b0: F,
    /// Feed-forward coefficient on `x[n-1]`.
    pub b1: F,
    /// Feed-forward coefficient on `x[n-2]`.
    pub b2: F,
    /// Feedback coefficient on `y[n-1]`.
    pub a1: F,
    /// Feedback coefficient on `y[n-2]`.
    pub a2: F,
}

impl<F: IirFloat> Biquad<F> {
    /// Coefficients in export order `b0, b1, b2, a1, a2`.
    pub fn coefficients(&self) -> [F; 5] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    /// Rebuild from `b0, b1, b2, a1, a2`.
    pub fn from_coefficients(c: [F; 5]) -> Self {
        Self {
            b0: c[0],
            b1: c[1],
            b2: c[2],
            a1: c[3],
            a2: c[4],
        }
    }

    /// True for a degenerate first-order section.
    pub fn is_first_order(&self) -> bool {
        self.b2 == F::zero() && self.a2 == F::zero()
    }

    /// True when all five coefficients are finite.
    pub fn is_finite(&self) -> bool {
        self.coefficients().iter().all(|c| c.is_finite())
    }

    /// Section response at `z_inv = z^-1`.
    pub fn response(&self, z_inv: Complex<F>) -> Complex<F> {
        let z_inv2 = z_inv * z_inv;
        let one = Complex::new(F::one(), F::zero());
        let num = z_inv2.scale(self.b2) + z_inv.scale(self.b1) + Complex::new(self.b0, F::zero());
        let den = z_inv2.scale(self.a2) + z_inv.scale(self.a1) + one;
        num / den
    }

    /// Multiply the numerator by `gain`.
    pub fn scale_numerator(&mut self, gain: F) {
        self.b0 = self.b0 * gain;
        self.b1 = self.b1 * gain;
        self.b2 = self.b2 * gain;
    }
}

/// Move the leading real pole/zero of an odd-order prototype to the end,
/// where the section synthesizer expects the unpaired root.
pub fn isolate_real_root<F: IirFloat>(mut set: RootSet<F>) -> RootSet<F> {
    if set.len() % 2 == 1 {
        set.poles.rotate_left(1);
        set.zeros.rotate_left(1);
    }
    set
}

/// Synthesize `ceil(order / 2)` sections from a z-plane root set.
///
/// Entries `2i` and `2i + 1` are conjugate partners; only `2i` is read.
/// When `order` is odd the final entry is the lone real root and becomes a
/// first-order section.
pub fn zplane_to_sections<F: IirFloat>(set: &RootSet<F>, order: usize) -> Result<Vec<Biquad<F>>> {
    if set.len() < order {
        return Err(Error::ExecInvariantViolation {
            reason: alloc::format!("{} roots cannot hold order {order}", set.len()),
        });
    }

    let num_sections = order.div_ceil(2);
    let mut sections = Vec::with_capacity(num_sections);
    for i in 0..num_sections {
        let pole = set.poles[2 * i];
        let zero = set.zeros[2 * i];
        let section = if order % 2 == 1 && i == num_sections - 1 {
            Biquad {
                b0: F::one(),
                b1: -zero.re,
                b2: F::zero(),
                a1: -pole.re,
                a2: F::zero(),
            }
        } else {
            let z = to_polar(zero);
            let p = to_polar(pole);
            let two = lit::<F>(2.0);
            Biquad {
                b0: F::one(),
                b1: -two * z.magnitude * z.angle.cos(),
                b2: z.magnitude * z.magnitude,
                a1: -two * p.magnitude * p.angle.cos(),
                a2: p.magnitude * p.magnitude,
            }
        };
        if !section.is_finite() {
            return Err(Error::NonFiniteCoefficient { section: i });
        }
        sections.push(section);
    }
    debug!(order, sections = sections.len(), "synthesized cascade");
    Ok(sections)
}
