//! Error types.
//!
//! Two layers:
//!
//! - [`FitError`]: the engine's failure taxonomy. Most variants describe why a
//!   single candidate or shape was discarded and never leave `fit`; only
//!   `NoFeasibleModel` and the precondition errors are returned to callers.
//! - [`AppError`]: what the `cpm` binary reports, carrying a process exit code.

use serde::Serialize;
use thiserror::Error;

use crate::domain::ModelShape;

/// Which slope regime an error or statistic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Heating,
    Cooling,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Regime::Heating => write!(f, "heating"),
            Regime::Cooling => write!(f, "cooling"),
        }
    }
}

/// Why a candidate fit is numerically unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateKind {
    /// The design matrix does not have full column rank.
    RankDeficient,
    /// Usage has (near) zero variance, so R² is undefined.
    ZeroVariance,
    /// Mean usage is (near) zero, so CV-RMSE is undefined.
    ZeroMeanUsage,
    /// A breakpoint is not strictly inside the observed temperature range.
    BreakpointOutOfRange,
    /// Heating changepoint is not below the cooling changepoint.
    UnorderedBreakpoints,
    /// The solver or the statistics produced a non-finite value.
    NonFinite,
}

impl std::fmt::Display for DegenerateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DegenerateKind::RankDeficient => "design matrix is rank deficient",
            DegenerateKind::ZeroVariance => "usage has zero variance",
            DegenerateKind::ZeroMeanUsage => "mean usage is zero",
            DegenerateKind::BreakpointOutOfRange => "breakpoint outside observed temperature range",
            DegenerateKind::UnorderedBreakpoints => "heating changepoint is not below cooling changepoint",
            DegenerateKind::NonFinite => "non-finite value in fit",
        };
        f.write_str(text)
    }
}

/// Engine failure taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FitError {
    /// A regime (or the whole series) has too few observations for a shape.
    #[error("insufficient data for {shape}: need at least {needed} observations, got {got}")]
    InsufficientData {
        shape: ModelShape,
        needed: usize,
        got: usize,
    },

    /// The candidate cannot be fitted or scored.
    #[error("degenerate fit: {0}")]
    DegenerateFit(DegenerateKind),

    /// A fitted slope violates the heating/cooling sign convention.
    #[error("invalid {regime} slope sign: {slope}")]
    InvalidSlopeSign { regime: Regime, slope: f64 },

    /// Every breakpoint candidate for the shape was rejected.
    #[error("no feasible breakpoint for {0}")]
    NoFeasibleBreakpoint(ModelShape),

    /// Not even the constant model can be computed.
    #[error("no feasible model: {0}")]
    NoFeasibleModel(String),

    /// The observation series violates the input preconditions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value is out of range.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Error reported by the `cpm` binary.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::InvalidInput(_) | FitError::InvalidOptions(_) => 2,
            FitError::NoFeasibleModel(_) => 3,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_error_messages_name_the_shape() {
        let err = FitError::InsufficientData {
            shape: ModelShape::HeatingOnly,
            needed: 6,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for 3P-H: need at least 6 observations, got 2"
        );

        let err = FitError::NoFeasibleBreakpoint(ModelShape::HeatingAndCooling);
        assert_eq!(err.to_string(), "no feasible breakpoint for 5P");

        let err = FitError::DegenerateFit(DegenerateKind::ZeroVariance);
        assert_eq!(err.to_string(), "degenerate fit: usage has zero variance");
    }

    #[test]
    fn fit_errors_map_to_exit_codes() {
        let app: AppError = FitError::NoFeasibleModel("no observations".into()).into();
        assert_eq!(app.exit_code(), 3);

        let app: AppError = FitError::InvalidInput("length mismatch".into()).into();
        assert_eq!(app.exit_code(), 2);

        let app: AppError = FitError::DegenerateFit(DegenerateKind::NonFinite).into();
        assert_eq!(app.exit_code(), 4);
    }
}
