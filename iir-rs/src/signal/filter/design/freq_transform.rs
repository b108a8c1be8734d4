//! Analog frequency transforms from the normalized low-pass prototype.

use alloc::vec;

use iir_rs_core::complex::{infinite_root, is_infinite_root, lit, IirFloat};
use nalgebra::Complex;

use super::{FilterBandType, RootSet};

/// Low-pass to low-pass scaling: every finite root is multiplied by `factor`.
pub fn scale_roots<F: IirFloat>(set: RootSet<F>, factor: F) -> RootSet<F> {
    set.map(|c| {
        if is_infinite_root(&c) {
            c
        } else {
            c.scale(factor)
        }
    })
}

/// Low-pass to high-pass inversion `s -> 1/s`, applied positionally.
///
/// The origin and infinity swap places; finite results are reflected into
/// the left half-plane.
pub fn high_pass_transform<F: IirFloat>(set: RootSet<F>) -> RootSet<F> {
    set.map(invert_root)
}

fn invert_root<F: IirFloat>(c: Complex<F>) -> Complex<F> {
    if is_infinite_root(&c) {
        return Complex::new(F::zero(), F::zero());
    }
    if c.re == F::zero() && c.im == F::zero() {
        return infinite_root();
    }
    let t = c.inv();
    Complex::new(-t.re.abs(), t.im)
}

/// Low-pass to band-pass or band-stop mapping around `omega_zero`.
///
/// The prototype must already be scaled by the bandwidth term. Each entry
/// `i` of an `n`-entry set yields the two roots of
/// `s^2 - p s + omega_zero^2 = 0` (with `p = 1/x` for band-stop), stored at
/// `i` and `2n - 1 - i`; the result has `2n` entries and keeps conjugate
/// partners adjacent. Any band type other than band-stop is treated as
/// band-pass.
pub fn bandpass_bandstop_transform<F: IirFloat>(
    set: RootSet<F>,
    band: FilterBandType,
    omega_zero: F,
) -> RootSet<F> {
    let n = set.len();
    let bandstop = matches!(band, FilterBandType::Bandstop);
    let origin = Complex::new(F::zero(), F::zero());
    let mut poles = vec![origin; 2 * n];
    let mut zeros = vec![origin; 2 * n];

    for (i, (p, z)) in set.poles.iter().zip(set.zeros.iter()).enumerate() {
        let partner = i % 2 == 1;
        let (lo, hi) = split_root(*p, bandstop, omega_zero, partner);
        poles[i] = lo;
        poles[2 * n - 1 - i] = hi;
        let (lo, hi) = split_root(*z, bandstop, omega_zero, partner);
        zeros[i] = lo;
        zeros[2 * n - 1 - i] = hi;
    }
    RootSet { poles, zeros }
}

/// `partner` marks the second entry of a prototype conjugate pair, whose
/// band-centre roots are emitted in the opposite order.
fn split_root<F: IirFloat>(
    x: Complex<F>,
    bandstop: bool,
    omega_zero: F,
    partner: bool,
) -> (Complex<F>, Complex<F>) {
    let is_origin = x.re == F::zero() && x.im == F::zero();
    let notch = Complex::new(F::zero(), omega_zero);

    // roots at the band centre
    if (bandstop && is_infinite_root(&x)) || (!bandstop && is_origin) {
        return if partner {
            (notch.conj(), notch)
        } else {
            (notch, notch.conj())
        };
    }
    // one root at the origin, the other at infinity
    if is_infinite_root(&x) || is_origin {
        return (infinite_root(), Complex::new(F::zero(), F::zero()));
    }

    let pc = if bandstop { x.inv() } else { x };
    let w2 = lit::<F>(4.0) * omega_zero * omega_zero;
    let disc = (pc * pc - Complex::new(w2, F::zero())).sqrt();
    let half = lit::<F>(0.5);
    let lo = (pc - disc).scale(half);
    let hi = (pc + disc).scale(half);
    (
        Complex::new(-lo.re.abs(), lo.im),
        Complex::new(-hi.re.abs(), hi.im),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::filter::design::prototype::butterworth_prototype;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use iir_rs_core::complex::is_conjugate_pair;

    #[test]
    fn scaling_keeps_infinite_zeros() {
        let set = scale_roots(butterworth_prototype::<f64>(3), 2.5);
        assert!(set.zeros.iter().all(is_infinite_root));
        for p in &set.poles {
            assert_abs_diff_eq!(p.norm(), 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn high_pass_moves_zeros_to_origin_and_inverts_poles() {
        let proto = scale_roots(butterworth_prototype::<f64>(4), 0.5);
        let hp = high_pass_transform(proto);
        for z in &hp.zeros {
            assert_eq!(*z, Complex::new(0.0, 0.0));
        }
        for p in &hp.poles {
            assert!(p.re < 0.0);
            assert_abs_diff_eq!(p.norm(), 2.0, epsilon = 1e-12);
        }
        assert!(is_conjugate_pair(&hp.poles[0], &hp.poles[1], 1e-12));
    }

    #[test]
    fn origin_inverts_to_infinity() {
        let set = RootSet {
            poles: vec![Complex::new(-1.0f64, 0.0)],
            zeros: vec![Complex::new(0.0, 0.0)],
        };
        let hp = high_pass_transform(set);
        assert!(is_infinite_root(&hp.zeros[0]));
    }

    #[test]
    fn bandpass_doubles_and_centres_roots() {
        let w0 = 1.3f64;
        let bw = 0.4;
        let proto = scale_roots(butterworth_prototype::<f64>(2), bw);
        let bp = bandpass_bandstop_transform(proto, FilterBandType::Bandpass, w0);
        assert_eq!(bp.len(), 4);
        assert!(bp.poles.iter().all(|p| p.re < 0.0));
        for pair in [0, 2] {
            assert!(is_conjugate_pair(&bp.poles[pair], &bp.poles[pair + 1], 1e-12));
        }
        // mirrored roots multiply to omega_zero^2
        let prod = bp.poles[0] * bp.poles[3];
        assert_relative_eq!(prod.norm(), w0 * w0, max_relative = 1e-12);
        // infinite prototype zeros split into infinity and the origin
        assert!(is_infinite_root(&bp.zeros[0]));
        assert_eq!(bp.zeros[3], Complex::new(0.0, 0.0));
    }

    #[test]
    fn bandstop_places_conjugate_notches() {
        let w0 = 0.8f64;
        let proto = scale_roots(butterworth_prototype::<f64>(2), 1.0 / 0.3);
        let bs = bandpass_bandstop_transform(proto, FilterBandType::Bandstop, w0);
        assert_eq!(bs.len(), 4);
        for pair in [0, 2] {
            assert!(is_conjugate_pair(&bs.zeros[pair], &bs.zeros[pair + 1], 0.0));
            assert_eq!(bs.zeros[pair].re, 0.0);
            assert_abs_diff_eq!(bs.zeros[pair].im.abs(), w0, epsilon = 1e-15);
        }
        assert!(bs.poles.iter().all(|p| p.re < 0.0));
    }
}
