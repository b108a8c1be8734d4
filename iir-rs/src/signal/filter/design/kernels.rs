//! Trait-first kernel for the IIR synthesis pipeline.

use crate::kernel::{
    output_of_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D,
};
use crate::signal::traits::IirDesign;
use iir_rs_core::complex::{lit, IirFloat};
use tracing::debug;

use alloc::vec::Vec;

use super::{
    iirdesign_dyn, CascadeDesign, FilterBandType, FilterSpecification, FilterType,
    TranslationMethod, BESSEL_MAX_ORDER, MAX_ORDER,
};

/// Constructor config for [`IirDesignKernel`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IirDesignConfig<F> {
    /// Prototype order; doubled in the cascade for band-pass/band-stop.
    pub order: usize,
    /// Band edges in Hz: one for low/high-pass, two for band-pass/stop.
    pub band_edges: Vec<F>,
    /// Sample rate in Hz.
    pub fs: F,
    /// Band type.
    pub btype: FilterBandType,
    /// Approximation family.
    pub ftype: FilterType<F>,
    /// Optional s-plane to z-plane mapping (default bilinear).
    #[cfg_attr(feature = "serde", serde(default))]
    pub translation: Option<TranslationMethod>,
    /// Optional band edge pre-warping for the bilinear transform (default true).
    #[cfg_attr(feature = "serde", serde(default))]
    pub prewarp: Option<bool>,
    /// Optional gain normalization (default true).
    #[cfg_attr(feature = "serde", serde(default))]
    pub normalize_gain: Option<bool>,
}

/// Trait-first IIR design kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct IirDesignKernel<F> {
    spec: FilterSpecification<F>,
}

impl<F: IirFloat> IirDesignKernel<F> {
    /// The validated, derived specification.
    pub fn specification(&self) -> &FilterSpecification<F> {
        &self.spec
    }

    /// Number of sections [`IirDesign::run_into`] writes.
    pub fn num_sections(&self) -> usize {
        self.spec.num_sections()
    }
}

fn check_positive<F: IirFloat>(
    value: F,
    arg: &'static str,
    reason: &'static str,
) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= F::zero() {
        return Err(ConfigError::InvalidArgument { arg, reason });
    }
    Ok(())
}

impl<F> KernelLifecycle for IirDesignKernel<F>
where
    F: IirFloat,
{
    type Config = IirDesignConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.order == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "order must be greater than zero",
            });
        }
        if config.order > MAX_ORDER {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "order exceeds the supported maximum",
            });
        }
        if config.btype.doubles_order() && config.order % 2 != 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "bandpass/bandstop designs require an even order",
            });
        }
        check_positive(config.fs, "fs", "fs must be finite and positive")?;

        if config.band_edges.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "band_edges" });
        }
        let expected = config.btype.edge_count();
        if config.band_edges.len() != expected {
            return Err(ConfigError::LengthMismatch {
                arg: "band_edges",
                expected,
                got: config.band_edges.len(),
            });
        }
        let nyq = config.fs / lit(2.0);
        if config
            .band_edges
            .iter()
            .any(|w| !w.is_finite() || *w <= F::zero() || *w >= nyq)
        {
            return Err(ConfigError::InvalidArgument {
                arg: "band_edges",
                reason: "band edges must satisfy 0 < edge < fs/2",
            });
        }
        if config.band_edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidArgument {
                arg: "band_edges",
                reason: "band edges must be strictly increasing",
            });
        }

        match config.ftype {
            FilterType::Butterworth => {}
            FilterType::ChebyshevI { rp } => check_positive(rp, "rp", "rp must be positive")?,
            FilterType::ChebyshevII { rs } => check_positive(rs, "rs", "rs must be positive")?,
            FilterType::CauerElliptic { rp, rs } => {
                check_positive(rp, "rp", "rp must be positive")?;
                check_positive(rs, "rs", "rs must be positive")?;
                if rs <= rp {
                    return Err(ConfigError::InvalidArgument {
                        arg: "rs",
                        reason: "rs must exceed rp for elliptic designs",
                    });
                }
            }
            FilterType::BesselThomson => {
                if config.order > BESSEL_MAX_ORDER {
                    return Err(ConfigError::InvalidArgument {
                        arg: "order",
                        reason: "Bessel designs are tabulated up to order 10",
                    });
                }
            }
        }

        let spec = FilterSpecification::from_band_edges(
            config.order,
            config.btype,
            config.ftype,
            config.translation.unwrap_or_default(),
            config.prewarp.unwrap_or(true),
            config.normalize_gain.unwrap_or(true),
            &config.band_edges,
            config.fs,
        )
        .map_err(|_| ConfigError::InvalidArgument {
            arg: "band_edges",
            reason: "band edges do not match the band type",
        })?;
        debug!(order = spec.order, btype = ?spec.btype, ftype = ?spec.ftype, "design kernel ready");

        Ok(Self { spec })
    }
}

impl<F> IirDesign<F> for IirDesignKernel<F>
where
    F: IirFloat,
{
    type Output = CascadeDesign<F>;

    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation> {
        Ok(iirdesign_dyn(&self.spec)?)
    }

    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<F> + ?Sized,
    {
        let out_slice = output_of_len(out, 5 * self.spec.num_sections())?;
        let design = iirdesign_dyn(&self.spec)?;
        for (chunk, section) in out_slice.chunks_exact_mut(5).zip(design.sections.iter()) {
            chunk.copy_from_slice(&section.coefficients());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{IirDesignConfig, IirDesignKernel};
    use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle};
    use crate::signal::filter::design::{
        FilterBandType, FilterType, GainNormalization, TranslationMethod,
    };
    use crate::signal::filter::response::cascade_response_at;
    use crate::signal::traits::IirDesign;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    fn lowpass(order: usize, ftype: FilterType<f64>) -> IirDesignConfig<f64> {
        IirDesignConfig {
            order,
            band_edges: vec![1000.0],
            fs: 8000.0,
            btype: FilterBandType::Lowpass,
            ftype,
            translation: None,
            prewarp: None,
            normalize_gain: None,
        }
    }

    #[test]
    fn butterworth_lowpass_kernel_scenario() {
        let kernel = IirDesignKernel::try_new(lowpass(4, FilterType::Butterworth))
            .expect("kernel should initialize");
        let design = kernel.run_alloc().expect("design should run");
        assert_eq!(design.num_sections(), 2);
        assert!(design.zplane.poles.iter().all(|p| p.norm() < 1.0));
        assert_abs_diff_eq!(
            cascade_response_at(&design.sections, 0.0).norm(),
            1.0,
            epsilon = 1e-9
        );
        assert!(matches!(
            design.normalization,
            GainNormalization::Applied { .. }
        ));
    }

    #[test]
    fn run_into_writes_flat_coefficients() {
        let kernel = IirDesignKernel::try_new(lowpass(3, FilterType::ChebyshevI { rp: 0.5 }))
            .expect("kernel should initialize");
        let expected = kernel.run_alloc().expect("design should run").coefficients();

        let mut out = vec![0.0f64; 10];
        kernel.run_into(&mut out).expect("run_into should succeed");
        assert_eq!(out, expected);

        let mut arr = Array1::<f64>::zeros(10);
        kernel.run_into(&mut arr).expect("run_into should succeed");
        assert_eq!(arr.to_vec(), expected);

        let mut too_short = [0.0f64; 9];
        let err = kernel
            .run_into(&mut too_short)
            .expect_err("output size mismatch must fail");
        assert_eq!(
            err,
            ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: 10,
                got: 9
            }
        );
    }

    #[test]
    fn section_count_is_half_the_effective_order() {
        let bands = [
            (FilterBandType::Lowpass, vec![1500.0]),
            (FilterBandType::Highpass, vec![1500.0]),
            (FilterBandType::Bandpass, vec![1000.0, 2500.0]),
            (FilterBandType::Bandstop, vec![1000.0, 2500.0]),
        ];
        for (btype, band_edges) in bands {
            for order in 1..=10usize {
                if btype.doubles_order() && order % 2 == 1 {
                    continue;
                }
                let kernel = IirDesignKernel::try_new(IirDesignConfig {
                    order,
                    band_edges: band_edges.clone(),
                    fs: 8000.0,
                    btype,
                    ftype: FilterType::ChebyshevII { rs: 40.0 },
                    translation: Some(TranslationMethod::Bilinear),
                    prewarp: Some(true),
                    normalize_gain: Some(true),
                })
                .expect("kernel should initialize");
                let effective = if btype.doubles_order() { 2 * order } else { order };
                let design = kernel.run_alloc().expect("design should run");
                assert_eq!(design.num_sections(), effective.div_ceil(2));
                assert_eq!(kernel.num_sections(), design.num_sections());
            }
        }
    }

    #[test]
    fn matched_z_designs_are_stable() {
        for ftype in [
            FilterType::Butterworth,
            FilterType::ChebyshevI { rp: 1.0 },
            FilterType::ChebyshevII { rs: 30.0 },
            FilterType::CauerElliptic { rp: 0.5, rs: 50.0 },
            FilterType::BesselThomson,
        ] {
            let mut config = lowpass(5, ftype);
            config.translation = Some(TranslationMethod::MatchedZ);
            let design = IirDesignKernel::try_new(config)
                .expect("kernel should initialize")
                .run_alloc()
                .expect("design should run");
            assert!(design.max_pole_radius() < 1.0, "{ftype:?}");
            assert!(design.sections.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn constructor_rejects_invalid_configs() {
        let err = IirDesignKernel::try_new(lowpass(0, FilterType::Butterworth))
            .expect_err("zero order must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "order", .. }));

        let err = IirDesignKernel::try_new(lowpass(33, FilterType::Butterworth))
            .expect_err("order above maximum must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "order", .. }));

        let err = IirDesignKernel::try_new(lowpass(11, FilterType::BesselThomson))
            .expect_err("Bessel order above table must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "order", .. }));

        let err = IirDesignKernel::try_new(lowpass(4, FilterType::ChebyshevI { rp: 0.0 }))
            .expect_err("zero ripple must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "rp", .. }));

        let err = IirDesignKernel::try_new(lowpass(4, FilterType::ChebyshevII { rs: -3.0 }))
            .expect_err("negative attenuation must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "rs", .. }));

        let err = IirDesignKernel::try_new(lowpass(
            4,
            FilterType::CauerElliptic { rp: 3.0, rs: 2.0 },
        ))
        .expect_err("rs below rp must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "rs", .. }));

        let mut config = lowpass(4, FilterType::Butterworth);
        config.band_edges = vec![4000.0];
        let err = IirDesignKernel::try_new(config).expect_err("edge at Nyquist must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidArgument {
                arg: "band_edges",
                ..
            }
        ));

        let mut config = lowpass(4, FilterType::Butterworth);
        config.fs = f64::NAN;
        let err = IirDesignKernel::try_new(config).expect_err("NaN rate must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "fs", .. }));

        let mut config = lowpass(4, FilterType::Butterworth);
        config.band_edges = Vec::new();
        let err = IirDesignKernel::try_new(config).expect_err("missing edges must fail");
        assert_eq!(err, ConfigError::EmptyInput { arg: "band_edges" });
    }

    #[test]
    fn constructor_rejects_mismatched_band_edges() {
        let mut config = lowpass(4, FilterType::Butterworth);
        config.btype = FilterBandType::Bandpass;
        let err = IirDesignKernel::try_new(config).expect_err("one edge for bandpass must fail");
        assert_eq!(
            err,
            ConfigError::LengthMismatch {
                arg: "band_edges",
                expected: 2,
                got: 1
            }
        );

        let mut config = lowpass(4, FilterType::Butterworth);
        config.btype = FilterBandType::Bandstop;
        config.band_edges = vec![2000.0, 1000.0];
        let err = IirDesignKernel::try_new(config).expect_err("decreasing edges must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidArgument {
                arg: "band_edges",
                ..
            }
        ));

        let mut config = lowpass(3, FilterType::Butterworth);
        config.btype = FilterBandType::Bandpass;
        config.band_edges = vec![1000.0, 2000.0];
        let err = IirDesignKernel::try_new(config).expect_err("odd bandpass order must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "order", .. }));
    }
}
