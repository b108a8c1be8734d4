//! Complex root helpers shared by every synthesis stage.
//!
//! Roots are plain [`Complex`] values. A zero at infinity is represented by
//! [`infinite_root`] and must be handled explicitly by each transform; no
//! stage relies on IEEE arithmetic to carry it through.

use core::fmt::Debug;

use nalgebra::Complex;
use num_traits::{Float, FloatConst};

/// Float types the synthesis pipeline is generic over.
pub trait IirFloat: Float + FloatConst + Debug + Send + Sync + 'static {}

impl<T> IirFloat for T where T: Float + FloatConst + Debug + Send + Sync + 'static {}

/// Convert an `f64` literal into `F`.
///
/// A failed cast yields NaN, which the finite-coefficient checks report.
#[inline]
pub fn lit<F: Float>(x: f64) -> F {
    F::from(x).unwrap_or_else(F::nan)
}

/// Convert a count into `F`.
#[inline]
pub fn count<F: Float>(n: usize) -> F {
    F::from(n).unwrap_or_else(F::nan)
}

/// The "zero at infinity" sentinel.
#[inline]
pub fn infinite_root<F: Float>() -> Complex<F> {
    Complex::new(F::zero(), F::infinity())
}

/// True when either component of `c` is infinite.
#[inline]
pub fn is_infinite_root<F: Float>(c: &Complex<F>) -> bool {
    c.re.is_infinite() || c.im.is_infinite()
}

/// True when both components are finite.
#[inline]
pub fn is_finite_root<F: Float>(c: &Complex<F>) -> bool {
    c.re.is_finite() && c.im.is_finite()
}

/// Polar form of a complex value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polar<F> {
    /// Distance from the origin.
    pub magnitude: F,
    /// Angle in radians, in `(-pi, pi]`.
    pub angle: F,
}

/// Rectangular to polar conversion.
///
/// The origin maps to magnitude 0, angle 0 rather than an undefined angle.
pub fn to_polar<F: Float>(c: Complex<F>) -> Polar<F> {
    let magnitude = c.norm();
    if magnitude == F::zero() {
        return Polar {
            magnitude,
            angle: F::zero(),
        };
    }
    Polar {
        magnitude,
        angle: c.im.atan2(c.re),
    }
}

/// Polar to rectangular conversion.
pub fn from_polar<F: Float>(p: Polar<F>) -> Complex<F> {
    Complex::from_polar(p.magnitude, p.angle)
}

/// True when `b` is the complex conjugate of `a` within `tol`.
pub fn is_conjugate_pair<F: Float>(a: &Complex<F>, b: &Complex<F>, tol: F) -> bool {
    if is_infinite_root(a) || is_infinite_root(b) {
        return is_infinite_root(a) && is_infinite_root(b);
    }
    (a.re - b.re).abs() <= tol && (a.im + b.im).abs() <= tol
}
