//! Coefficient export in floating-point, Q-format and 16-bit fixed-point
//! forms.
//!
//! Every export keeps the per-section `b0, b1, b2, a1, a2` ordering.
//! [`PoleZeroTable`] lists the z-plane roots behind a cascade.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use iir_rs_core::complex::{lit, to_polar, IirFloat};
use nalgebra::Complex;

use crate::kernel::{ConfigError, KernelLifecycle};
use crate::signal::filter::design::Biquad;

/// Default Q-format integer bits.
pub const DEFAULT_Q_INTEGER_BITS: u32 = 8;
/// Default Q-format fraction bits.
pub const DEFAULT_Q_FRACTION_BITS: u32 = 24;

/// Convert `x` to an `m.n` Q-format word: `trunc(x * 2^n)` masked to the
/// low `m + n` bits.
///
/// `m + n` is expected in `1..=63`; [`CoefficientExporter`] checks it.
/// Values beyond the `i64` range saturate before masking.
pub fn q_format_integer<F: IirFloat>(x: F, m: u32, n: u32) -> u64 {
    let scaled = (x * lit::<F>(2.0).powi(n as i32)).trunc();
    let word = scaled.to_i64().unwrap_or(if scaled > F::zero() {
        i64::MAX
    } else {
        i64::MIN
    });
    let bits = m + n;
    let mask = if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };
    (word as u64) & mask
}

/// Convert `x` to a 16-bit word: `trunc(x * 32767)` saturated to `i16`,
/// returned as its two's-complement bit pattern.
pub fn fixed16_word<F: IirFloat>(x: F) -> u16 {
    let scaled = (x * lit::<F>(32767.0)).trunc();
    let word = scaled
        .to_i64()
        .unwrap_or(if scaled > F::zero() { i64::MAX } else { i64::MIN })
        .clamp(i16::MIN as i64, i16::MAX as i64) as i16;
    word as u16
}

/// Constructor config for [`CoefficientExporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportConfig {
    /// Optional Q-format integer bits `m` (default 8).
    #[cfg_attr(feature = "serde", serde(default))]
    pub q_integer_bits: Option<u32>,
    /// Optional Q-format fraction bits `n` (default 24).
    #[cfg_attr(feature = "serde", serde(default))]
    pub q_fraction_bits: Option<u32>,
    /// Optional sign flip of `a1, a2` for multiply-accumulate targets
    /// (default false).
    #[cfg_attr(feature = "serde", serde(default))]
    pub negate_feedback: Option<bool>,
}

/// Validated coefficient exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefficientExporter {
    m: u32,
    n: u32,
    negate_feedback: bool,
}

impl KernelLifecycle for CoefficientExporter {
    type Config = ExportConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let m = config.q_integer_bits.unwrap_or(DEFAULT_Q_INTEGER_BITS);
        let n = config.q_fraction_bits.unwrap_or(DEFAULT_Q_FRACTION_BITS);
        let bits = m.checked_add(n).unwrap_or(u32::MAX);
        if !(1..=63).contains(&bits) {
            return Err(ConfigError::InvalidArgument {
                arg: "q_format",
                reason: "m + n must be between 1 and 63",
            });
        }
        Ok(Self {
            m,
            n,
            negate_feedback: config.negate_feedback.unwrap_or(false),
        })
    }
}

impl CoefficientExporter {
    /// Q-format `(m, n)`.
    pub fn q_format(&self) -> (u32, u32) {
        (self.m, self.n)
    }

    fn signed<F: IirFloat>(&self, s: &Biquad<F>) -> [F; 5] {
        let mut c = s.coefficients();
        if self.negate_feedback {
            c[3] = -c[3];
            c[4] = -c[4];
        }
        c
    }

    /// Floating-point coefficients.
    pub fn float_coefficients<F: IirFloat>(&self, sections: &[Biquad<F>]) -> Vec<F> {
        sections.iter().flat_map(|s| self.signed(s)).collect()
    }

    /// Q-format words.
    pub fn q_format_coefficients<F: IirFloat>(&self, sections: &[Biquad<F>]) -> Vec<u64> {
        self.float_coefficients(sections)
            .into_iter()
            .map(|c| q_format_integer(c, self.m, self.n))
            .collect()
    }

    /// 16-bit fixed-point words.
    pub fn fixed16_coefficients<F: IirFloat>(&self, sections: &[Biquad<F>]) -> Vec<u16> {
        self.float_coefficients(sections)
            .into_iter()
            .map(fixed16_word)
            .collect()
    }

    /// All three forms as C array listings.
    pub fn listing<F: IirFloat + fmt::LowerExp>(
        &self,
        sections: &[Biquad<F>],
    ) -> CoefficientListing<F> {
        CoefficientListing {
            float: self.float_coefficients(sections),
            q_format: self.q_format_coefficients(sections),
            fixed16: self.fixed16_coefficients(sections),
            m: self.m,
            n: self.n,
        }
    }
}

/// Exported coefficients, rendered as C arrays by its `Display` impl.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CoefficientListing<F> {
    /// Floating-point coefficients.
    pub float: Vec<F>,
    /// Q-format words.
    pub q_format: Vec<u64>,
    /// 16-bit words.
    pub fixed16: Vec<u16>,
    /// Q-format integer bits.
    pub m: u32,
    /// Q-format fraction bits.
    pub n: u32,
}

fn write_array<T, W>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    width: usize,
    values: &[T],
    mut item: W,
) -> fmt::Result
where
    W: FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
{
    writeln!(f, "const {name}[] =\n{{")?;
    for (i, section) in values.chunks(width).enumerate() {
        if i > 0 {
            writeln!(f, ",")?;
        }
        write!(f, "\t")?;
        for (j, v) in section.iter().enumerate() {
            if j > 0 {
                write!(f, ", ")?;
            }
            item(f, v)?;
        }
    }
    writeln!(f, "\n}};")
}

impl<F: fmt::LowerExp> fmt::Display for CoefficientListing<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\t/* Floating point coefficients */")?;
        write_array(f, "CoefficientArray", 5, &self.float, |f, v| write!(f, "{v:.20e}"))?;
        writeln!(f)?;
        writeln!(f, "\t/* Q format fixed point coefficients */")?;
        writeln!(f, "\t\t/* m = {}, n = {} */", self.m, self.n)?;
        write_array(f, "CoefficientArray", 5, &self.q_format, |f, v| write!(f, "0x{v:x}"))?;
        writeln!(f)?;
        writeln!(f, "\t/* 16 bit fixed point coefficients */")?;
        write_array(f, "CoefficientArray", 5, &self.fixed16, |f, v| write!(f, "0x{v:x}"))
    }
}

impl<F: fmt::LowerExp> CoefficientListing<F> {
    /// Render to a `String`.
    pub fn render(&self) -> String {
        alloc::format!("{self}")
    }
}

/// z-plane roots in polar and rectangular form, rendered as C arrays.
///
/// Rows follow the `pole, zero, pole, zero, ...` plot order of
/// [`CascadeDesign::pole_zero`](crate::signal::filter::design::CascadeDesign::pole_zero),
/// so each pair is followed by its conjugates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoleZeroTable<F> {
    /// Flat `magnitude, angle` rows; angles in degrees, `0..360`.
    pub polar: Vec<F>,
    /// Flat `re, im` rows.
    pub rectangular: Vec<F>,
}

impl<F: IirFloat> PoleZeroTable<F> {
    /// Tabulate interleaved plot roots.
    pub fn from_roots(roots: &[Complex<F>]) -> Self {
        let full_turn = lit::<F>(360.0);
        let mut polar = Vec::with_capacity(2 * roots.len());
        let mut rectangular = Vec::with_capacity(2 * roots.len());
        for root in roots {
            let p = to_polar(*root);
            let degrees = p.angle.to_degrees();
            polar.push(p.magnitude);
            polar.push(if degrees < F::zero() { degrees + full_turn } else { degrees });
            rectangular.push(root.re);
            rectangular.push(root.im);
        }
        Self { polar, rectangular }
    }
}

impl<F: fmt::LowerExp> fmt::Display for PoleZeroTable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\t/* Poles and zeros: magnitude, angle (degrees) */")?;
        write_array(f, "zDomainPolarArray", 2, &self.polar, |f, v| write!(f, "{v:.20e}"))?;
        writeln!(f)?;
        writeln!(f, "\t/* Poles and zeros: real, imaginary */")?;
        write_array(f, "zDomainRectangularArray", 2, &self.rectangular, |f, v| {
            write!(f, "{v:.20e}")
        })
    }
}
