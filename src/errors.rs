//! Shared error types used across submodules.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactanceError {
    /// A connection mode other than series or parallel was requested.
    #[error("invalid connection mode: {0:?} (expected \"series\" or \"parallel\")")]
    InvalidConnection(String),
    /// A waveform kind outside the supported set was requested.
    #[error("invalid waveform kind: {0}")]
    InvalidWaveform(String),
    /// A phase string could not be parsed.
    #[error("invalid phase: {0:?} (expected a number suffixed with rad, deg or °)")]
    InvalidPhase(String),
    /// A literal zero was used as a divisor.
    #[error("division by zero in {context}")]
    DivisionByZero {
        /// Operation that attempted the division.
        context: String,
    },
    /// An expression was evaluated with a free symbol left unbound.
    #[error("symbol {0} has no value")]
    UnboundSymbol(String),
    /// A real-valued operation received a complex argument.
    #[error("{operation} expects a real argument, got {value}")]
    NonReal {
        /// Operation that required a real value.
        operation: &'static str,
        /// Offending value, formatted.
        value: String,
    },
    /// The root finder gave up before meeting its tolerance.
    #[error("root finder did not converge after {iterations} iterations (last estimate {last:e})")]
    NotConvergent {
        /// Number of iterations spent.
        iterations: usize,
        /// Best estimate at termination.
        last: f64,
    },
}

impl ReactanceError {
    /// Shorthand for a [`ReactanceError::DivisionByZero`] in `context`.
    pub fn division_by_zero(context: impl Into<String>) -> Self {
        Self::DivisionByZero {
            context: context.into(),
        }
    }

    /// True for invalid modes, waveform kinds and phase strings.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConnection(_) | Self::InvalidWaveform(_) | Self::InvalidPhase(_)
        )
    }

    /// True for arithmetic failures on literal values.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::DivisionByZero { .. } | Self::NonReal { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ReactanceError>;
