//! The immutable outcome of a `fit` call.

use serde::Serialize;

use crate::domain::{ModelShape, SelectionReason, ShapeOutcome, Thresholds};
use crate::models;

/// The chosen change-point model.
///
/// Built once by the assembler; every accessor is a pure read of the stored
/// values, so `is_valid()` and `predict()` give the same answer for the life of
/// the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub(crate) shape: ModelShape,
    pub(crate) baseload: f64,
    pub(crate) heating_slope: Option<f64>,
    pub(crate) heating_changepoint: Option<f64>,
    pub(crate) cooling_changepoint: Option<f64>,
    pub(crate) cooling_slope: Option<f64>,
    pub(crate) r_squared: Option<f64>,
    pub(crate) cvrmse: Option<f64>,
    pub(crate) heating_pvalue: Option<f64>,
    pub(crate) cooling_pvalue: Option<f64>,
    pub(crate) n_observations: usize,
    pub(crate) slopes_plausible: bool,
    pub(crate) slopes_significant: bool,
    pub(crate) thresholds: Thresholds,
    pub(crate) selection: SelectionReason,
    pub(crate) shapes: Vec<ShapeOutcome>,
    #[serde(skip)]
    pub(crate) coefficients: Vec<f64>,
    #[serde(skip)]
    pub(crate) breakpoints: Vec<f64>,
}

impl FitResult {
    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    /// Short label: `1P`, `3P-H`, `3P-C` or `5P`.
    pub fn label(&self) -> &'static str {
        self.shape.label()
    }

    pub fn long_label(&self) -> &'static str {
        self.shape.long_label()
    }

    /// Parameter count of the chosen shape (1, 3 or 5).
    pub fn complexity(&self) -> usize {
        self.shape.param_count()
    }

    pub fn baseload(&self) -> f64 {
        self.baseload
    }

    pub fn heating_slope(&self) -> Option<f64> {
        self.heating_slope
    }

    pub fn heating_changepoint(&self) -> Option<f64> {
        self.heating_changepoint
    }

    pub fn cooling_slope(&self) -> Option<f64> {
        self.cooling_slope
    }

    pub fn cooling_changepoint(&self) -> Option<f64> {
        self.cooling_changepoint
    }

    /// `None` when usage has (near) zero variance.
    pub fn r_squared(&self) -> Option<f64> {
        self.r_squared
    }

    /// `None` when mean usage is (near) zero.
    pub fn cvrmse(&self) -> Option<f64> {
        self.cvrmse
    }

    pub fn heating_pvalue(&self) -> Option<f64> {
        self.heating_pvalue
    }

    pub fn cooling_pvalue(&self) -> Option<f64> {
        self.cooling_pvalue
    }

    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn selection(&self) -> SelectionReason {
        self.selection
    }

    /// Per-shape diagnostics in `ModelShape::ALL` order.
    pub fn shapes(&self) -> &[ShapeOutcome] {
        &self.shapes
    }

    /// Coefficients as `[baseload, heating_slope?, cooling_slope?]`.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Breakpoints as `[heating_changepoint?, cooling_changepoint?]`.
    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    /// Whether the stored statistics clear the thresholds captured at fit time.
    pub fn is_valid(&self) -> bool {
        if self.selection == SelectionReason::ConstantFallback {
            return false;
        }
        let (Some(r2), Some(cv)) = (self.r_squared, self.cvrmse) else {
            return false;
        };
        r2 >= self.thresholds.min_r_squared
            && cv <= self.thresholds.max_cvrmse
            && self.slopes_plausible
            && (!self.thresholds.require_significant_slopes || self.slopes_significant)
    }

    /// Predicted usage at `temperature`.
    pub fn predict(&self, temperature: f64) -> f64 {
        models::predict(self.shape, temperature, &self.coefficients, &self.breakpoints)
    }

    pub fn fitted_values(&self, temperatures: &[f64]) -> Vec<f64> {
        temperatures.iter().map(|&t| self.predict(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heating_result(r_squared: Option<f64>, selection: SelectionReason) -> FitResult {
        FitResult {
            shape: ModelShape::HeatingOnly,
            baseload: 40.0,
            heating_slope: Some(-2.0),
            heating_changepoint: Some(55.0),
            cooling_changepoint: None,
            cooling_slope: None,
            r_squared,
            cvrmse: Some(0.1),
            heating_pvalue: Some(0.01),
            cooling_pvalue: None,
            n_observations: 12,
            slopes_plausible: true,
            slopes_significant: true,
            thresholds: Thresholds {
                min_r_squared: 0.6,
                max_cvrmse: 0.5,
                require_significant_slopes: false,
            },
            selection,
            shapes: Vec::new(),
            coefficients: vec![40.0, -2.0],
            breakpoints: vec![55.0],
        }
    }

    #[test]
    fn predict_uses_stored_terms() {
        let result = heating_result(Some(0.9), SelectionReason::MeetsThresholds);
        assert_eq!(result.predict(45.0), 60.0);
        assert_eq!(result.predict(70.0), 40.0);
        assert_eq!(result.fitted_values(&[50.0, 60.0]), vec![50.0, 40.0]);
        assert_eq!(result.label(), "3P-H");
        assert_eq!(result.long_label(), "3P Heating");
        assert_eq!(result.complexity(), 3);
    }

    #[test]
    fn validity_follows_thresholds() {
        assert!(heating_result(Some(0.9), SelectionReason::MeetsThresholds).is_valid());
        assert!(!heating_result(Some(0.5), SelectionReason::BestEffort).is_valid());
        assert!(!heating_result(None, SelectionReason::BestEffort).is_valid());
        assert!(!heating_result(Some(0.9), SelectionReason::ConstantFallback).is_valid());

        let mut strict = heating_result(Some(0.9), SelectionReason::MeetsThresholds);
        strict.thresholds.require_significant_slopes = true;
        strict.slopes_significant = false;
        assert!(!strict.is_valid());
    }

    #[test]
    fn serializes_labels_and_skips_raw_vectors() {
        let result = heating_result(Some(0.9), SelectionReason::MeetsThresholds);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["shape"], "3P-H");
        assert_eq!(json["selection"], "meets_thresholds");
        assert!(json.get("coefficients").is_none());
        assert!(json["cooling_slope"].is_null());
    }
}
