//! Bessel-Thomson low-pass prototype poles.
//!
//! Upper-half-plane poles for orders 1 through 10, normalized so the
//! magnitude response is 3 dB down at 1 rad/s. For odd orders the real pole
//! is the last entry of its row.

use alloc::vec::Vec;

use iir_rs_core::complex::{lit, IirFloat};
use iir_rs_core::{Error, Result};
use nalgebra::Complex;

use super::RootSet;

/// Highest order covered by the pole table.
pub const BESSEL_MAX_ORDER: usize = 10;

const BESSEL_POLES: [&[(f64, f64)]; BESSEL_MAX_ORDER] = [
    &[(-1.0, 0.0)],
    &[(-1.10160133059, 0.636009824757)],
    &[(-1.0474091610, 0.9992644363), (-1.3226757999, 0.0)],
    &[
        (-0.995208764350, 1.25710573945),
        (-1.37006783055, 0.410249717494),
    ],
    &[
        (-0.9576765486, 1.4711243207),
        (-1.3808773259, 0.7179095876),
        (-1.5023162714, 0.0),
    ],
    &[
        (-0.930656522947, 1.66186326894),
        (-1.38185809760, 0.971471890712),
        (-1.57149040362, 0.320896374221),
    ],
    &[
        (-0.9098677806, 1.8364513530),
        (-1.3789032168, 1.1915667778),
        (-1.6120387662, 0.5892445069),
        (-1.6843681793, 0.0),
    ],
    &[
        (-0.892869718847, 1.99832584364),
        (-1.37384121764, 1.38835657588),
        (-1.63693941813, 0.822795625139),
        (-1.75740840040, 0.272867575103),
    ],
    &[
        (-0.8783992762, 2.1498005243),
        (-1.3675883098, 1.5677337122),
        (-1.6523964846, 1.0313895670),
        (-1.8071705350, 0.5123837306),
        (-1.8566005012, 0.0),
    ],
    &[
        (-0.865756901707, 2.29260483098),
        (-1.36069227838, 1.73350574267),
        (-1.66181024140, 1.22110021857),
        (-1.84219624443, 0.727257597722),
        (-1.92761969145, 0.241623471082),
    ],
];

/// Look up the Bessel prototype for `order`.
///
/// Each table entry is followed by its conjugate, so the result holds
/// `2 * ceil(order / 2)` entries; for odd orders the trailing entry is a
/// duplicate of the real pole and callers keep the first `order`.
/// Every zero is a zero at infinity.
pub fn bessel_poles<F>(order: usize) -> Result<RootSet<F>>
where
    F: IirFloat,
{
    if order == 0 || order > BESSEL_MAX_ORDER {
        return Err(Error::invalid_arg(
            "order",
            "Bessel prototypes are tabulated for orders 1..=10",
        ));
    }

    let row = BESSEL_POLES[order - 1];
    let mut poles = Vec::with_capacity(2 * row.len());
    for &(re, im) in row {
        let p = Complex::new(lit::<F>(re), lit::<F>(im));
        poles.push(p);
        poles.push(p.conj());
    }
    Ok(RootSet::all_pole(poles))
}
