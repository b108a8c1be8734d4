//! Normalized low-pass analog prototypes.
//!
//! Butterworth, Chebyshev I and elliptic prototypes have their pass-band
//! edge at 1 rad/s; Chebyshev II is normalized at its stop-band edge and
//! Bessel at its 3 dB point. For odd orders every family except Bessel
//! stores the lone real pole first.

use alloc::vec::Vec;

use iir_rs_core::complex::{count, infinite_root, IirFloat};
use iir_rs_core::Result;
use nalgebra::Complex;
use tracing::trace;

use super::bessel::bessel_poles;
use super::elliptic::{
    arc_elliptic_tan, complete_elliptic_integral, db_to_ratio, jacobi_elliptic, selectivity,
};
use super::{FilterType, RootSet};

/// Generate the normalized prototype for `order` and family `ftype`.
///
/// Ripple and attenuation are assumed positive (checked by the design
/// kernel), with `rs > rp` for elliptic designs.
pub fn analog_prototype<F>(order: usize, ftype: &FilterType<F>) -> Result<RootSet<F>>
where
    F: IirFloat,
{
    let set = match *ftype {
        FilterType::Butterworth => butterworth_prototype(order),
        FilterType::ChebyshevI { rp } => chebyshev1_prototype(order, rp),
        FilterType::ChebyshevII { rs } => chebyshev2_prototype(order, rs),
        FilterType::CauerElliptic { rp, rs } => elliptic_prototype(order, rp, rs)?,
        FilterType::BesselThomson => {
            let mut set = bessel_poles(order)?;
            set.truncate(order);
            set
        }
    };
    trace!(order, poles = ?set.poles, zeros = ?set.zeros, "analog prototype");
    Ok(set)
}

/// Butterworth poles on the unit circle.
pub fn butterworth_prototype<F: IirFloat>(order: usize) -> RootSet<F> {
    ellipse_roots(order, F::one(), F::one(), false)
}

/// Chebyshev type I poles for `rp` dB of pass-band ripple.
pub fn chebyshev1_prototype<F: IirFloat>(order: usize, rp: F) -> RootSet<F> {
    let mu = (F::one() / db_to_ratio(rp)).asinh() / count(order);
    ellipse_roots(order, mu.sinh(), mu.cosh(), false)
}

/// Chebyshev type II (inverse Chebyshev) poles and zeros for `rs` dB of
/// stop-band attenuation.
pub fn chebyshev2_prototype<F: IirFloat>(order: usize, rs: F) -> RootSet<F> {
    let mu = db_to_ratio(rs).asinh() / count(order);
    ellipse_roots(order, mu.sinh(), mu.cosh(), true)
}

/// Walks the ellipse angles in conjugate order.
///
/// `j` indexes the angle `pi/2 * j/n` from the real axis; it starts at 0 for
/// odd orders so the real pole lands first, and advances after each
/// conjugate pair is complete.
fn ellipse_roots<F: IirFloat>(order: usize, sinh_mu: F, cosh_mu: F, inverse: bool) -> RootSet<F> {
    let n = count::<F>(order);
    let odd = order % 2 == 1;
    let mut poles = Vec::with_capacity(order);
    let mut zeros = Vec::with_capacity(order);

    let mut j: usize = if odd { 0 } else { 1 };
    let mut sign = F::one();
    for i in 0..order {
        let theta = F::FRAC_PI_2() * count::<F>(j) / n;
        let tr = -sinh_mu * theta.cos();
        let ti = cosh_mu * theta.sin();

        if inverse {
            let zero = if j != 0 {
                Complex::new(F::zero(), sign / theta.sin())
            } else {
                infinite_root()
            };
            let mag2 = tr * tr + ti * ti;
            poles.push(Complex::new(tr / mag2, sign * ti / mag2));
            zeros.push(zero);
        } else {
            poles.push(Complex::new(tr, sign * ti));
            zeros.push(infinite_root());
        }

        if (i % 2 == 0) == odd {
            j += 2;
        }
        sign = -sign;
    }
    RootSet { poles, zeros }
}

/// Cauer (elliptic) poles and zeros.
///
/// The selectivity `k` follows from the order, ripple and attenuation; the
/// stop band starts at `1/k` rad/s.
pub fn elliptic_prototype<F: IirFloat>(order: usize, rp: F, rs: F) -> Result<RootSet<F>> {
    let n = count::<F>(order);
    let eps = db_to_ratio(rp);
    let k1 = eps / db_to_ratio(rs);
    let k = selectivity(order, rp, rs)?;
    let kc = (F::one() - k * k).sqrt();

    let kk = complete_elliptic_integral(kc)?;
    let kk1 = complete_elliptic_integral((F::one() - k1 * k1).sqrt())?;
    let v0 = (kk / kk1 / n) * arc_elliptic_tan(F::one() / eps, k1)?;
    let (sm, cm, dm) = jacobi_elliptic(v0, k)?;
    let stop_edge = F::one() / k;

    let odd = order % 2 == 1;
    let mut poles = Vec::with_capacity(order);
    let mut zeros = Vec::with_capacity(order);
    let mut j: usize = if odd { 0 } else { 1 };
    let mut sign = F::one();
    for i in 0..order {
        let (sn, cn, dn) = jacobi_elliptic(kk * count::<F>(j) / n, kc)?;
        zeros.push(if j != 0 {
            Complex::new(F::zero(), sign * stop_edge / sn)
        } else {
            infinite_root()
        });
        let den = F::one() - (dn * sm) * (dn * sm);
        poles.push(Complex::new(
            -sm * cm * cn * dn / den,
            sign * dm * sn / den,
        ));

        if (i % 2 == 0) == odd {
            j += 2;
        }
        sign = -sign;
    }
    Ok(RootSet { poles, zeros })
}
