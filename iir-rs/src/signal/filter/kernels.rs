//! Trait-first kernel wrappers for filtering primitives.

use crate::kernel::{
    output_of_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::traits::SosFilt1D;
use alloc::vec::Vec;
use iir_rs_core::complex::IirFloat;

use super::design::Biquad;
use super::{sosfilt_checked_slice, SectionState};

/// Constructor config for [`SosFiltKernel`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SosFiltConfig<F> {
    /// Second-order sections, in evaluation order.
    pub sections: Vec<Biquad<F>>,
    /// Optional initial delay-line state, one entry per section (default zero).
    #[cfg_attr(feature = "serde", serde(default))]
    pub state: Option<Vec<SectionState<F>>>,
}

/// Stateful 1D cascade filtering kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct SosFiltKernel<F> {
    sections: Vec<Biquad<F>>,
    state: Vec<SectionState<F>>,
}

impl<F: IirFloat> SosFiltKernel<F> {
    /// Current delay-line state.
    pub fn state(&self) -> &[SectionState<F>] {
        &self.state
    }

    /// Clear the delay lines.
    pub fn reset(&mut self) {
        self.state = SectionState::zeros(self.sections.len());
    }
}

impl<F> KernelLifecycle for SosFiltKernel<F>
where
    F: IirFloat,
{
    type Config = SosFiltConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.sections.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "sections" });
        }
        if config.sections.iter().any(|s| !s.is_finite()) {
            return Err(ConfigError::InvalidArgument {
                arg: "sections",
                reason: "section coefficients must be finite",
            });
        }
        let state = match config.state {
            Some(state) if state.len() != config.sections.len() => {
                return Err(ConfigError::LengthMismatch {
                    arg: "state",
                    expected: config.sections.len(),
                    got: state.len(),
                });
            }
            Some(state) => state,
            None => SectionState::zeros(config.sections.len()),
        };
        Ok(Self {
            sections: config.sections,
            state,
        })
    }
}

impl<F> SosFilt1D<F> for SosFiltKernel<F>
where
    F: IirFloat,
{
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let input = input.read_slice()?;
        let out_slice = output_of_len(out, input.len())?;
        let y = sosfilt_checked_slice(input, &self.sections, &mut self.state)?;
        out_slice.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<F>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        let input = input.read_slice()?;
        Ok(sosfilt_checked_slice(
            input,
            &self.sections,
            &mut self.state,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ConfigError;
    use crate::signal::filter::sosfilt_dyn;
    use ndarray::Array1;

    fn smoother() -> Vec<Biquad<f64>> {
        vec![
            Biquad {
                b0: 0.25,
                b1: 0.5,
                b2: 0.25,
                a1: -0.2,
                a2: 0.05,
            },
            Biquad {
                b0: 0.5,
                b1: 0.5,
                b2: 0.0,
                a1: 0.0,
                a2: 0.0,
            },
        ]
    }

    #[test]
    fn sosfilt_kernel_matches_function() {
        let mut kernel = SosFiltKernel::try_new(SosFiltConfig {
            sections: smoother(),
            state: None,
        })
        .expect("kernel should initialize");
        let x = [1.0f64, 2.0, 3.0, 4.0];
        let mut y = [0.0f64; 4];
        kernel
            .run_into(&x, &mut y)
            .expect("sosfilt kernel should run");

        let mut state = SectionState::zeros(2);
        let expected = sosfilt_dyn(x.iter(), &smoother(), &mut state).expect("cascade should run");
        assert_eq!(y, expected.as_slice());
        assert_eq!(kernel.state(), state.as_slice());
    }

    #[test]
    fn kernel_state_persists_until_reset() {
        let mut kernel = SosFiltKernel::try_new(SosFiltConfig {
            sections: smoother(),
            state: None,
        })
        .expect("kernel should initialize");
        let first = kernel.run_alloc(&vec![1.0f64; 8]).expect("first block");
        let second = kernel.run_alloc(&vec![1.0f64; 8]).expect("second block");
        assert_ne!(first, second);

        kernel.reset();
        let input = Array1::from(vec![1.0f64; 8]);
        let again = kernel.run_alloc(&input).expect("after reset");
        assert_eq!(first, again);
    }

    #[test]
    fn output_length_is_checked() {
        let mut kernel = SosFiltKernel::try_new(SosFiltConfig {
            sections: smoother(),
            state: None,
        })
        .expect("kernel should initialize");
        let mut too_short = vec![0.0f64; 3];
        let err = kernel
            .run_into(&[1.0f64, 2.0, 3.0, 4.0], &mut too_short)
            .expect_err("output size mismatch must fail");
        assert!(matches!(
            err,
            ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: 4,
                got: 3
            }
        ));
    }

    #[test]
    fn constructor_rejects_bad_cascades() {
        let err = SosFiltKernel::<f64>::try_new(SosFiltConfig {
            sections: Vec::new(),
            state: None,
        })
        .expect_err("empty cascade must fail");
        assert_eq!(err, ConfigError::EmptyInput { arg: "sections" });

        let err = SosFiltKernel::try_new(SosFiltConfig {
            sections: smoother(),
            state: Some(SectionState::zeros(1)),
        })
        .expect_err("short state must fail");
        assert_eq!(
            err,
            ConfigError::LengthMismatch {
                arg: "state",
                expected: 2,
                got: 1
            }
        );

        let mut sections = smoother();
        sections[1].a1 = f64::NAN;
        let err = SosFiltKernel::try_new(SosFiltConfig {
            sections,
            state: None,
        })
        .expect_err("NaN coefficient must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "sections", .. }));
    }
}
