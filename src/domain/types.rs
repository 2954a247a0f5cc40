//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON alongside a fit result
//! - built from CLI flags without the engine knowing about the CLI

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Change-point model shape.
///
/// Each shape is a piecewise-linear predictor of usage against temperature:
///
/// ```text
/// usage(t) = baseload
///          + heating_slope * min(t - heating_changepoint, 0)
///          + cooling_slope * max(t - cooling_changepoint, 0)
/// ```
///
/// with the terms a shape does not have left out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
pub enum ModelShape {
    /// Baseload only (1 parameter).
    #[serde(rename = "1P")]
    #[value(name = "1p")]
    ConstantOnly,
    /// Baseload plus a heating hinge (3 parameters).
    #[serde(rename = "3P-H")]
    #[value(name = "3p-h")]
    HeatingOnly,
    /// Baseload plus a cooling hinge (3 parameters).
    #[serde(rename = "3P-C")]
    #[value(name = "3p-c")]
    CoolingOnly,
    /// Baseload plus heating and cooling hinges (5 parameters).
    #[serde(rename = "5P")]
    #[value(name = "5p")]
    HeatingAndCooling,
}

impl ModelShape {
    /// Every shape, simplest first. Search and reporting iterate in this order.
    pub const ALL: [ModelShape; 4] = [
        ModelShape::ConstantOnly,
        ModelShape::HeatingOnly,
        ModelShape::CoolingOnly,
        ModelShape::HeatingAndCooling,
    ];

    /// Short label (`1P`, `3P-H`, `3P-C`, `5P`).
    pub fn label(self) -> &'static str {
        match self {
            ModelShape::ConstantOnly => "1P",
            ModelShape::HeatingOnly => "3P-H",
            ModelShape::CoolingOnly => "3P-C",
            ModelShape::HeatingAndCooling => "5P",
        }
    }

    /// Human-readable label for terminal output.
    pub fn long_label(self) -> &'static str {
        match self {
            ModelShape::ConstantOnly => "1P",
            ModelShape::HeatingOnly => "3P Heating",
            ModelShape::CoolingOnly => "3P Cooling",
            ModelShape::HeatingAndCooling => "5P",
        }
    }

    /// Total parameter count (coefficients + breakpoints).
    pub fn param_count(self) -> usize {
        self.coefficient_len() + self.breakpoint_count()
    }

    /// Number of linear coefficients (baseload + slopes).
    pub fn coefficient_len(self) -> usize {
        match self {
            ModelShape::ConstantOnly => 1,
            ModelShape::HeatingOnly | ModelShape::CoolingOnly => 2,
            ModelShape::HeatingAndCooling => 3,
        }
    }

    /// Number of breakpoint temperatures.
    pub fn breakpoint_count(self) -> usize {
        match self {
            ModelShape::ConstantOnly => 0,
            ModelShape::HeatingOnly | ModelShape::CoolingOnly => 1,
            ModelShape::HeatingAndCooling => 2,
        }
    }

    pub fn has_heating(self) -> bool {
        matches!(self, ModelShape::HeatingOnly | ModelShape::HeatingAndCooling)
    }

    pub fn has_cooling(self) -> bool {
        matches!(self, ModelShape::CoolingOnly | ModelShape::HeatingAndCooling)
    }

    /// Complexity tier used by the selector: 0 for 1P, 1 for 3P, 2 for 5P.
    pub fn complexity_rank(self) -> u8 {
        match self {
            ModelShape::ConstantOnly => 0,
            ModelShape::HeatingOnly | ModelShape::CoolingOnly => 1,
            ModelShape::HeatingAndCooling => 2,
        }
    }

    /// Minimum series length before the shape is attempted.
    ///
    /// `regime_min` is the per-slope-regime minimum; the baseload regime needs 1.
    pub fn min_observations(self, regime_min: usize) -> usize {
        match self {
            ModelShape::ConstantOnly => 1,
            ModelShape::HeatingOnly | ModelShape::CoolingOnly => 2 * regime_min,
            ModelShape::HeatingAndCooling => regime_min + 1 + regime_min + 1,
        }
    }
}

impl std::fmt::Display for ModelShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How breakpoint candidates with (numerically) equal R² are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Prefer breakpoints closer to the median observed temperature.
    NearestMedian,
    /// Prefer the lowest breakpoint temperature(s) in scan order.
    LowestTemperature,
}

/// Engine configuration for a single `fit` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Minimum R² for a shape to qualify.
    pub min_r_squared: f64,
    /// Maximum CV-RMSE for a shape to qualify.
    pub max_cvrmse: f64,
    /// Minimum observations in each slope regime (never below 2).
    pub min_points_per_regime: usize,
    /// Fixed breakpoint grid spacing. `None` scans the distinct observed temperatures.
    pub breakpoint_grid_step: Option<f64>,
    /// Shapes to attempt.
    pub shapes_to_try: Vec<ModelShape>,
    /// Upper bound on the number of candidate breakpoints per axis.
    pub max_grid_points: usize,
    /// Subdivisions per side for the local refinement pass (0 disables it).
    pub refine_steps: usize,
    /// Ordering of candidates whose R² ties within `tie_tolerance`.
    pub tie_break: TieBreak,
    /// R² difference treated as a tie.
    pub tie_tolerance: f64,
    /// Two-sided p-value below which a slope counts as significant.
    pub significance_level: f64,
    /// Require every slope to be significant for a shape to qualify.
    pub require_significant_slopes: bool,
}

pub const DEFAULT_MIN_R_SQUARED: f64 = 0.6;
pub const DEFAULT_MAX_CVRMSE: f64 = 0.5;
pub const DEFAULT_MIN_POINTS_PER_REGIME: usize = 3;
pub const DEFAULT_MAX_GRID_POINTS: usize = 200;
pub const DEFAULT_REFINE_STEPS: usize = 10;
pub const DEFAULT_TIE_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.1;

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            min_r_squared: DEFAULT_MIN_R_SQUARED,
            max_cvrmse: DEFAULT_MAX_CVRMSE,
            min_points_per_regime: DEFAULT_MIN_POINTS_PER_REGIME,
            breakpoint_grid_step: None,
            shapes_to_try: ModelShape::ALL.to_vec(),
            max_grid_points: DEFAULT_MAX_GRID_POINTS,
            refine_steps: DEFAULT_REFINE_STEPS,
            tie_break: TieBreak::NearestMedian,
            tie_tolerance: DEFAULT_TIE_TOLERANCE,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            require_significant_slopes: false,
        }
    }
}

impl FitOptions {
    /// Effective per-slope-regime minimum.
    pub fn regime_min(&self) -> usize {
        self.min_points_per_regime.max(2)
    }

    /// Threshold snapshot stored on every result.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_r_squared: self.min_r_squared,
            max_cvrmse: self.max_cvrmse,
            require_significant_slopes: self.require_significant_slopes,
        }
    }

    pub fn validate(&self) -> Result<(), FitError> {
        if !(self.min_r_squared.is_finite() && (0.0..=1.0).contains(&self.min_r_squared)) {
            return Err(FitError::InvalidOptions(format!(
                "min_r_squared must be within [0, 1], got {}",
                self.min_r_squared
            )));
        }
        if !(self.max_cvrmse.is_finite() && self.max_cvrmse >= 0.0) {
            return Err(FitError::InvalidOptions(format!(
                "max_cvrmse must be finite and >= 0, got {}",
                self.max_cvrmse
            )));
        }
        if let Some(step) = self.breakpoint_grid_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(FitError::InvalidOptions(format!(
                    "breakpoint_grid_step must be finite and > 0, got {step}"
                )));
            }
        }
        if self.shapes_to_try.is_empty() {
            return Err(FitError::InvalidOptions(
                "shapes_to_try must name at least one shape".to_string(),
            ));
        }
        if self.max_grid_points < 2 {
            return Err(FitError::InvalidOptions(format!(
                "max_grid_points must be >= 2, got {}",
                self.max_grid_points
            )));
        }
        if !(self.tie_tolerance.is_finite() && self.tie_tolerance >= 0.0) {
            return Err(FitError::InvalidOptions(format!(
                "tie_tolerance must be finite and >= 0, got {}",
                self.tie_tolerance
            )));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(FitError::InvalidOptions(format!(
                "significance_level must be within (0, 1), got {}",
                self.significance_level
            )));
        }
        Ok(())
    }
}

/// Quality thresholds captured at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_r_squared: f64,
    pub max_cvrmse: f64,
    pub require_significant_slopes: bool,
}

/// Per-slope statistics of a candidate fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlopeStats {
    pub slope: f64,
    /// Two-sided t-test p-value over the regime subset, when computable.
    pub p_value: Option<f64>,
    pub significant: bool,
    /// Correct sign and a non-negligible effect over the observed range.
    pub plausible: bool,
}

/// One evaluated (shape, breakpoints) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFit {
    pub shape: ModelShape,
    /// Heating changepoint first, then cooling.
    pub breakpoints: Vec<f64>,
    /// Baseload, then heating slope, then cooling slope.
    pub coefficients: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub sse: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub cvrmse: f64,
    pub n: usize,
    pub heating: Option<SlopeStats>,
    pub cooling: Option<SlopeStats>,
}

impl CandidateFit {
    fn slopes(&self) -> impl Iterator<Item = &SlopeStats> {
        self.heating.iter().chain(self.cooling.iter())
    }

    pub fn slopes_plausible(&self) -> bool {
        self.slopes().all(|s| s.plausible)
    }

    pub fn slopes_significant(&self) -> bool {
        self.slopes().all(|s| s.significant)
    }

    /// Whether the candidate clears the quality bars of `thresholds`.
    pub fn qualifies(&self, thresholds: &Thresholds) -> bool {
        self.r_squared >= thresholds.min_r_squared
            && self.cvrmse <= thresholds.max_cvrmse
            && self.slopes_plausible()
            && (!thresholds.require_significant_slopes || self.slopes_significant())
    }
}

/// Why the selector picked the returned shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// The most complex shape that cleared every threshold.
    MeetsThresholds,
    /// No shape cleared the thresholds; the highest-R² shape is returned.
    BestEffort,
    /// No shape could be fitted; a mean-usage constant model is returned.
    ConstantFallback,
}

impl SelectionReason {
    pub fn describe(self) -> &'static str {
        match self {
            SelectionReason::MeetsThresholds => "most complex shape meeting thresholds",
            SelectionReason::BestEffort => "best effort (highest R², thresholds unmet)",
            SelectionReason::ConstantFallback => "constant fallback (no shape could be fitted)",
        }
    }
}

/// What happened to one shape during selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeOutcome {
    pub shape: ModelShape,
    pub status: ShapeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShapeStatus {
    Fitted {
        r_squared: f64,
        cvrmse: f64,
        breakpoints: Vec<f64>,
        qualifies: bool,
    },
    Skipped {
        reason: FitError,
    },
}
