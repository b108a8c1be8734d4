//! Time and frequency response of a designed cascade.
//!
//! The frequency-domain views are taken from the FFT of the cascade's
//! impulse response, so they reflect the quantized section coefficients
//! exactly as [`super::sosfilt_dyn`] would run them.

use alloc::vec::Vec;

use iir_rs_core::complex::{count, lit, IirFloat};
use iir_rs_core::Result;
use nalgebra::Complex;
use rustfft::{FftNum, FftPlanner};
use tracing::debug;

use crate::kernel::{
    output_of_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D,
};
use crate::signal::traits::CascadeAnalysis;

use super::design::{unit_circle_z_inv, Biquad};
use super::{sosfilt_checked_slice, SectionState};

/// FFT length used when none is configured.
pub const DEFAULT_FFT_LEN: usize = 1024;

/// Gain reported for bins whose power is numerically zero.
pub const GAIN_FLOOR_DB: f64 = -150.0;

/// Cascade response `H(e^{j 2 pi f})` at `frequency` (cycles per sample).
pub fn cascade_response_at<F: IirFloat>(sections: &[Biquad<F>], frequency: F) -> Complex<F> {
    let z_inv = unit_circle_z_inv(frequency);
    sections
        .iter()
        .fold(Complex::new(F::one(), F::zero()), |acc, s| acc * s.response(z_inv))
}

/// First `len` samples of the cascade's impulse response.
pub fn impulse_response<F: IirFloat>(sections: &[Biquad<F>], len: usize) -> Result<Vec<F>> {
    let mut x = alloc::vec![F::zero(); len];
    if let Some(first) = x.first_mut() {
        *first = F::one();
    }
    let mut state = SectionState::zeros(sections.len());
    sosfilt_checked_slice(&x, sections, &mut state)
}

/// First `len` samples of the step response, the running sum of the
/// impulse response.
pub fn step_response<F: IirFloat>(sections: &[Biquad<F>], len: usize) -> Result<Vec<F>> {
    let impulse = impulse_response(sections, len)?;
    Ok(running_sum(&impulse))
}

fn running_sum<F: IirFloat>(x: &[F]) -> Vec<F> {
    x.iter()
        .scan(F::zero(), |acc, v| {
            *acc = *acc + *v;
            Some(*acc)
        })
        .collect()
}

fn wrap_phase<F: IirFloat>(mut d: F) -> F {
    while d > F::PI() {
        d = d - F::TAU();
    }
    while d <= -F::PI() {
        d = d + F::TAU();
    }
    d
}

/// One-sided response views over `fft_len / 2` bins.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResponseAnalysis<F> {
    /// Bin frequencies in cycles per sample.
    pub frequencies: Vec<F>,
    /// Log-magnitude gain in dB, floored at [`GAIN_FLOOR_DB`].
    pub gain_db: Vec<F>,
    /// Wrapped phase in radians.
    pub phase: Vec<F>,
    /// Group delay in samples.
    pub group_delay: Vec<F>,
    /// Impulse response.
    pub impulse: Vec<F>,
    /// Step response.
    pub step: Vec<F>,
}

/// Analyze a cascade through an `fft_len`-point FFT of its impulse response.
///
/// `fft_len` must be at least 4; [`ResponseKernel`] also enforces a power
/// of two.
pub fn analyze_cascade<F>(sections: &[Biquad<F>], fft_len: usize) -> Result<ResponseAnalysis<F>>
where
    F: IirFloat + FftNum,
{
    if fft_len < 4 {
        return Err(iir_rs_core::Error::invalid_arg(
            "fft_len",
            "fft length must be at least 4.",
        ));
    }
    let impulse = impulse_response(sections, fft_len)?;

    let mut buf: Vec<Complex<F>> = impulse.iter().map(|v| Complex::new(*v, F::zero())).collect();
    let mut planner = FftPlanner::<F>::new();
    let fft = planner.plan_fft_forward(fft_len);
    fft.process(&mut buf);

    let half = fft_len / 2;
    let floor = lit::<F>(GAIN_FLOOR_DB);
    let ten = lit::<F>(10.0);
    let gain_db = buf[..half]
        .iter()
        .map(|c| {
            let power = c.norm_sqr();
            if power > F::zero() {
                (ten * power.log10()).max(floor)
            } else {
                floor
            }
        })
        .collect();

    let phase_full: Vec<F> = buf[..=half].iter().map(|c| c.im.atan2(c.re)).collect();
    let bin_width = F::TAU() / count(fft_len);
    let group_delay = phase_full
        .windows(2)
        .map(|w| -wrap_phase(w[1] - w[0]) / bin_width)
        .collect();
    let phase = phase_full[..half].to_vec();

    let frequencies = (0..half)
        .map(|k| count::<F>(k) / count(fft_len))
        .collect();
    let step = running_sum(&impulse[..half]);
    debug!(fft_len, sections = sections.len(), "analyzed cascade response");

    Ok(ResponseAnalysis {
        frequencies,
        gain_db,
        phase,
        group_delay,
        impulse: impulse[..half].to_vec(),
        step,
    })
}

/// Constructor config for [`ResponseKernel`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseConfig<F> {
    /// Sections to analyze.
    pub sections: Vec<Biquad<F>>,
    /// Optional FFT length, a power of two of at least 4 (default 1024).
    #[cfg_attr(feature = "serde", serde(default))]
    pub fft_len: Option<usize>,
}

/// Trait-first response analysis kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseKernel<F> {
    sections: Vec<Biquad<F>>,
    fft_len: usize,
}

impl<F> KernelLifecycle for ResponseKernel<F>
where
    F: IirFloat,
{
    type Config = ResponseConfig<F>;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.sections.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "sections" });
        }
        if config.sections.iter().any(|s| !s.is_finite()) {
            return Err(ConfigError::InvalidArgument {
                arg: "sections",
                reason: "section coefficients must be finite",
            });
        }
        let fft_len = config.fft_len.unwrap_or(DEFAULT_FFT_LEN);
        if fft_len < 4 || !fft_len.is_power_of_two() {
            return Err(ConfigError::InvalidArgument {
                arg: "fft_len",
                reason: "fft_len must be a power of two and at least 4",
            });
        }
        Ok(Self {
            sections: config.sections,
            fft_len,
        })
    }
}

impl<F> CascadeAnalysis<F> for ResponseKernel<F>
where
    F: IirFloat + FftNum,
{
    type Output = ResponseAnalysis<F>;

    fn run_alloc(&self) -> core::result::Result<Self::Output, ExecInvariantViolation> {
        Ok(analyze_cascade(&self.sections, self.fft_len)?)
    }

    fn run_into<O>(&self, out: &mut O) -> core::result::Result<(), ExecInvariantViolation>
    where
        O: Write1D<F> + ?Sized,
    {
        let out_slice = output_of_len(out, self.fft_len / 2)?;
        let analysis = analyze_cascade(&self.sections, self.fft_len)?;
        out_slice.copy_from_slice(&analysis.gain_db);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::filter::design::{
        FilterBandType, FilterType, IirDesignConfig, IirDesignKernel,
    };
    use crate::signal::traits::IirDesign;
    use approx::assert_abs_diff_eq;

    fn unit_delay() -> Vec<Biquad<f64>> {
        vec![Biquad {
            b0: 0.0,
            b1: 1.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }]
    }

    fn butter(btype: FilterBandType, band_edges: Vec<f64>) -> Vec<Biquad<f64>> {
        IirDesignKernel::try_new(IirDesignConfig {
            order: 4,
            band_edges,
            fs: 8000.0,
            btype,
            ftype: FilterType::Butterworth,
            translation: None,
            prewarp: None,
            normalize_gain: None,
        })
        .expect("kernel should initialize")
        .run_alloc()
        .expect("design should run")
        .sections
    }

    #[test]
    fn unit_delay_has_flat_gain_and_one_sample_delay() {
        let analysis = analyze_cascade(&unit_delay(), 64).expect("analysis should run");
        assert_eq!(analysis.gain_db.len(), 32);
        assert_eq!(analysis.group_delay.len(), 32);
        for (g, d) in analysis.gain_db.iter().zip(analysis.group_delay.iter()) {
            assert_abs_diff_eq!(*g, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(*d, 1.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(analysis.phase[8], -core::f64::consts::TAU * 8.0 / 64.0, epsilon = 1e-12);
        assert_eq!(analysis.frequencies[16], 0.25);
    }

    #[test]
    fn step_is_running_sum_of_impulse() {
        let sections = butter(FilterBandType::Lowpass, vec![1000.0]);
        let impulse = impulse_response(&sections, 256).expect("impulse");
        let step = step_response(&sections, 256).expect("step");
        let mut acc = 0.0;
        for (h, s) in impulse.iter().zip(step.iter()) {
            acc += h;
            assert_abs_diff_eq!(*s, acc, epsilon = 1e-12);
        }
        // unit DC gain
        assert_abs_diff_eq!(step[255], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn lowpass_gain_matches_direct_evaluation() {
        let sections = butter(FilterBandType::Lowpass, vec![1000.0]);
        let analysis = analyze_cascade(&sections, 1024).expect("analysis should run");
        assert_abs_diff_eq!(analysis.gain_db[0], 0.0, epsilon = 1e-6);
        // 1000 Hz of 8000 Hz is bin 128
        assert_abs_diff_eq!(analysis.gain_db[128], -3.0103, epsilon = 1e-3);
        let direct = cascade_response_at(&sections, 100.0 / 1024.0).norm();
        assert_abs_diff_eq!(analysis.gain_db[100], 20.0 * direct.log10(), epsilon = 1e-6);
        assert!(analysis.group_delay[10] > 0.0);
    }

    #[test]
    fn highpass_floors_the_dc_bin() {
        let sections = butter(FilterBandType::Highpass, vec![1000.0]);
        let analysis = analyze_cascade(&sections, 1024).expect("analysis should run");
        assert!(analysis.gain_db[0] < -100.0);
        assert!(analysis.gain_db[0] >= GAIN_FLOOR_DB);
    }

    #[test]
    fn kernel_writes_gain_and_validates_config() {
        let kernel = ResponseKernel::try_new(ResponseConfig {
            sections: unit_delay(),
            fft_len: Some(16),
        })
        .expect("kernel should initialize");
        let mut gain = [1.0f64; 8];
        kernel.run_into(&mut gain).expect("run_into should succeed");
        for g in gain {
            assert_abs_diff_eq!(g, 0.0, epsilon = 1e-12);
        }
        let mut wrong = [0.0f64; 16];
        assert!(kernel.run_into(&mut wrong).is_err());

        let err = ResponseKernel::try_new(ResponseConfig {
            sections: unit_delay(),
            fft_len: Some(48),
        })
        .expect_err("non power of two must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "fft_len", .. }));

        let err = ResponseKernel::<f64>::try_new(ResponseConfig {
            sections: Vec::new(),
            fft_len: None,
        })
        .expect_err("empty cascade must fail");
        assert_eq!(err, ConfigError::EmptyInput { arg: "sections" });
    }
}
