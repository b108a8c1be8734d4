//! Elliptic integrals and Jacobi elliptic functions for Cauer prototypes.
//!
//! All routines iterate the arithmetic-geometric mean or a nome series and
//! stop on a relative tolerance; exceeding [`MAX_ITERATIONS`] is reported as
//! [`Error::NonConvergence`] instead of returning a partial result.

use iir_rs_core::complex::{count, lit, IirFloat};
use iir_rs_core::{Error, Result};

/// Iteration cap shared by every routine in this module.
pub const MAX_ITERATIONS: usize = 50;

fn tolerance<F: IirFloat>() -> F {
    lit::<F>(1e-15).max(F::epsilon() * lit(4.0))
}

fn non_convergence(routine: &str) -> Error {
    Error::NonConvergence {
        routine: routine.into(),
    }
}

/// Linear amplitude ratio of a dB figure: `sqrt(10^(a/10) - 1)`.
pub fn db_to_ratio<F: IirFloat>(a: F) -> F {
    (lit::<F>(10.0).powf(a / lit(10.0)) - F::one()).sqrt()
}

/// Complete elliptic integral of the first kind `K(k)`, given the
/// complementary modulus `kc = sqrt(1 - k^2)`.
pub fn complete_elliptic_integral<F: IirFloat>(kc: F) -> Result<F> {
    let mut a = F::one();
    let mut b = kc;
    for _ in 0..MAX_ITERATIONS {
        let at = (a + b) / lit(2.0);
        b = (a * b).sqrt();
        a = at;
        if (a - b) / a < tolerance() {
            return Ok(F::FRAC_PI_2() / a);
        }
    }
    Err(non_convergence("complete_elliptic_integral"))
}

/// Jacobi elliptic functions `(sn, cn, dn)` of `x`, for the modulus whose
/// complement is `kc`.
///
/// Valid for `0 <= x <= K`, which covers every argument the prototype uses.
pub fn jacobi_elliptic<F: IirFloat>(x: F, kc: F) -> Result<(F, F, F)> {
    if x == F::zero() {
        return Ok((F::zero(), F::one(), F::one()));
    }

    let mut aa = [F::zero(); MAX_ITERATIONS];
    let mut bb = [F::zero(); MAX_ITERATIONS];
    let mut a = F::one();
    let mut b = kc;
    for i in 0..MAX_ITERATIONS {
        aa[i] = a;
        bb[i] = b;
        let at = (a + b) / lit(2.0);
        b = (a * b).sqrt();
        a = at;
        if (a - b) / a < tolerance() {
            // descending Landen back to the requested modulus
            let mut c = a / (x * a).tan();
            let mut d = F::one();
            for idx in (0..=i).rev() {
                let e = c * c / a;
                c = c * d;
                a = aa[idx];
                d = (e + bb[idx]) / (e + a);
            }
            let sn = F::one() / (F::one() + c * c).sqrt();
            return Ok((sn, sn * c, d));
        }
    }
    Err(non_convergence("jacobi_elliptic"))
}

/// Modulus `k` whose period ratio `K'(k) / K(k)` equals `u`, from the nome
/// `q = exp(-pi u)` theta series.
pub fn modulus_from_period_ratio<F: IirFloat>(u: F) -> Result<F> {
    let q = (-F::PI() * u).exp();
    let mut d = q;
    let mut a = F::one();
    let mut b = F::one();
    let mut c = F::one();
    for _ in 0..MAX_ITERATIONS {
        a = a + lit::<F>(2.0) * c * d;
        c = c * d * d;
        b = b + c;
        d = d * q;
        if c < tolerance() {
            let ratio = b / a;
            return Ok(lit::<F>(4.0) * q.sqrt() * ratio * ratio);
        }
    }
    Err(non_convergence("modulus_from_period_ratio"))
}

/// Inverse of the Jacobi `sc` function by Landen iteration, scaled by the
/// final AGM term.
pub fn arc_elliptic_tan<F: IirFloat>(u: F, kc: F) -> Result<F> {
    let mut a = F::one();
    let mut b = kc;
    let mut y = F::one() / u;
    let mut k: usize = 0;
    for _ in 0..MAX_ITERATIONS {
        let bt = a * b;
        a = a + b;
        b = lit::<F>(2.0) * bt.sqrt();
        y = y - bt / y;
        if y == F::zero() {
            y = bt.sqrt() * lit(1e-10);
        }
        if (a - b).abs() < a * tolerance() {
            if y < F::zero() {
                k += 1;
            }
            let turns = count::<F>(k);
            return Ok(((a / y).atan() + F::PI() * turns) / a);
        }
        k *= 2;
        if y < F::zero() {
            k += 1;
        }
    }
    Err(non_convergence("arc_elliptic_tan"))
}

/// Smallest elliptic order meeting `rp` dB ripple up to `wp` and `rs` dB
/// attenuation from `ws` (analog edges, any common unit, `wp < ws`).
pub fn elliptic_min_order<F: IirFloat>(rp: F, rs: F, wp: F, ws: F) -> Result<usize> {
    if !(rp > F::zero() && rs > rp) {
        return Err(Error::invalid_arg(
            "rs",
            "attenuation must be positive and exceed the pass-band ripple",
        ));
    }
    if !(wp > F::zero() && ws > wp) {
        return Err(Error::invalid_arg("ws", "stop edge must lie above the pass edge"));
    }

    let k = wp / ws;
    let k1 = db_to_ratio(rp) / db_to_ratio(rs);
    let kk = complete_elliptic_integral((F::one() - k * k).sqrt())?;
    let kkc = complete_elliptic_integral(k)?;
    let kk1 = complete_elliptic_integral((F::one() - k1 * k1).sqrt())?;
    let kk1c = complete_elliptic_integral(k1)?;
    let degree = kk * kk1c / (kk1 * kkc);

    // guard against 3.0000000001 rounding up to 4
    let order = (degree - lit(1e-9)).ceil();
    order
        .to_usize()
        .map(|n| n.max(1))
        .ok_or_else(|| non_convergence("elliptic_min_order"))
}

/// Selectivity `k = wp / ws` reached by an order-`n` design with the given
/// ripple and attenuation, from the degree equation.
pub(crate) fn selectivity<F: IirFloat>(order: usize, rp: F, rs: F) -> Result<F> {
    let k1 = db_to_ratio(rp) / db_to_ratio(rs);
    let kk1 = complete_elliptic_integral((F::one() - k1 * k1).sqrt())?;
    let kk1c = complete_elliptic_integral(k1)?;
    modulus_from_period_ratio(kk1c / (count::<F>(order) * kk1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn complete_integral_at_zero_modulus_is_half_pi() {
        let k = complete_elliptic_integral(1.0f64).expect("converges");
        assert_abs_diff_eq!(k, core::f64::consts::FRAC_PI_2, epsilon = 1e-15);
    }

    #[test]
    fn complete_integral_reference_value() {
        // K(1/sqrt(2)) = Gamma(1/4)^2 / (4 sqrt(pi))
        let kc = (0.5f64).sqrt();
        let k = complete_elliptic_integral(kc).expect("converges");
        assert_abs_diff_eq!(k, 1.854_074_677_301_372, epsilon = 1e-12);
    }

    #[test]
    fn jacobi_functions_satisfy_identities() {
        let k = 0.6f64;
        let kc = (1.0 - k * k).sqrt();
        let (sn, cn, dn) = jacobi_elliptic(0.7, kc).expect("converges");
        assert_abs_diff_eq!(sn * sn + cn * cn, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dn * dn + k * k * sn * sn, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn jacobi_at_quarter_period() {
        let k = 0.8f64;
        let kc = (1.0 - k * k).sqrt();
        let quarter = complete_elliptic_integral(kc).expect("converges");
        let (sn, cn, dn) = jacobi_elliptic(quarter, kc).expect("converges");
        assert_abs_diff_eq!(sn, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cn, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dn, kc, epsilon = 1e-9);
    }

    #[test]
    fn arc_tan_inverts_jacobi_sc() {
        // the larger arguments take several half-turn corrections
        let kc = (1.0f64 - 0.64).sqrt();
        for x in [0.3, 0.9, 1.5] {
            let (sn, cn, _) = jacobi_elliptic(x, kc).expect("converges");
            let back = arc_elliptic_tan(sn / cn, kc).expect("converges");
            assert_abs_diff_eq!(back, x, epsilon = 1e-12);
        }
    }

    #[test]
    fn modulus_inverts_the_period_ratio() {
        let k = 0.4f64;
        let ratio = complete_elliptic_integral(k).expect("K'")
            / complete_elliptic_integral((1.0 - k * k).sqrt()).expect("K");
        let back = modulus_from_period_ratio(ratio).expect("converges");
        assert_abs_diff_eq!(back, k, epsilon = 1e-12);
    }

    #[test]
    fn selectivity_matches_known_design() {
        let k = selectivity(4, 1.0f64, 40.0).expect("converges");
        assert_abs_diff_eq!(k, 0.659_855_169_014_082_6, epsilon = 1e-9);
    }

    #[test]
    fn min_order_inverts_selectivity() {
        let k = selectivity(5, 0.5f64, 60.0).expect("converges");
        let n = elliptic_min_order(0.5, 60.0, k, 1.0).expect("valid edges");
        assert_eq!(n, 5);
        let looser = elliptic_min_order(0.5, 60.0, k * 0.9, 1.0).expect("valid edges");
        assert!(looser <= 5);
    }

    #[test]
    fn min_order_rejects_inverted_edges() {
        assert!(elliptic_min_order(1.0f64, 40.0, 2.0, 1.0).is_err());
        assert!(elliptic_min_order(1.0f64, 0.5, 1.0, 2.0).is_err());
    }
}
