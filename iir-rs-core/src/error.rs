use core::fmt;

/// Errors raised whilst synthesizing or evaluating a filter cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Argument passed into a function was invalid.
    InvalidArg {
        /// The invalid arg
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// An iterative numerical routine did not converge.
    NonConvergence {
        /// Name of the routine that gave up.
        routine: String,
    },
    /// A synthesized section carried a NaN or infinite coefficient.
    NonFiniteCoefficient {
        /// Index of the offending section in the cascade.
        section: usize,
    },
    /// Execution was attempted with a violated invariant.
    ExecInvariantViolation {
        /// Why execution could not proceed.
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidArg`].
    pub fn invalid_arg(arg: &str, reason: &str) -> Self {
        Error::InvalidArg {
            arg: arg.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            Error::NonConvergence { routine } => {
                write!(f, "Routine `{routine}` failed to converge.")
            }
            Error::NonFiniteCoefficient { section } => {
                write!(f, "Section {section} has a non-finite coefficient.")
            }
            Error::ExecInvariantViolation { reason } => {
                write!(f, "Execution invariant violation: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}
