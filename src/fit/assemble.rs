//! Turn the selected candidate (or the lack of one) into a `FitResult`.

use crate::domain::{
    CandidateFit, FitOptions, FitResult, ModelShape, Observations, SelectionReason, ShapeOutcome,
};
use crate::math::{is_zero_mean, is_zero_variance};
use crate::models::terms;

/// Wrap the winning candidate.
pub fn assemble(
    winner: &CandidateFit,
    selection: SelectionReason,
    opts: &FitOptions,
    shapes: Vec<ShapeOutcome>,
) -> FitResult {
    let t = terms(winner.shape, &winner.coefficients, &winner.breakpoints);
    FitResult {
        shape: winner.shape,
        baseload: t.baseload,
        heating_slope: t.heating.map(|h| h.slope),
        heating_changepoint: t.heating.map(|h| h.changepoint),
        cooling_changepoint: t.cooling.map(|c| c.changepoint),
        cooling_slope: t.cooling.map(|c| c.slope),
        r_squared: Some(winner.r_squared),
        cvrmse: Some(winner.cvrmse),
        heating_pvalue: winner.heating.and_then(|s| s.p_value),
        cooling_pvalue: winner.cooling.and_then(|s| s.p_value),
        n_observations: winner.n,
        slopes_plausible: winner.slopes_plausible(),
        slopes_significant: winner.slopes_significant(),
        thresholds: opts.thresholds(),
        selection,
        shapes,
        coefficients: winner.coefficients.clone(),
        breakpoints: winner.breakpoints.clone(),
    }
}

/// Mean-usage constant model used when no shape could be fitted.
///
/// R² is undefined for zero-variance usage and CV-RMSE for zero mean usage;
/// the result is never valid.
pub fn constant_fallback(
    obs: &Observations,
    opts: &FitOptions,
    shapes: Vec<ShapeOutcome>,
) -> FitResult {
    let n = obs.len();
    let mean = obs.usage_mean();
    let rmse = (obs.ss_total() / n as f64).sqrt();

    let r_squared = (!is_zero_variance(obs.ss_total(), mean, n)).then_some(0.0);
    let cvrmse = (!is_zero_mean(mean, obs.usage()))
        .then(|| rmse / mean.abs())
        .filter(|v| v.is_finite());

    FitResult {
        shape: ModelShape::ConstantOnly,
        baseload: mean,
        heating_slope: None,
        heating_changepoint: None,
        cooling_changepoint: None,
        cooling_slope: None,
        r_squared,
        cvrmse,
        heating_pvalue: None,
        cooling_pvalue: None,
        n_observations: n,
        slopes_plausible: true,
        slopes_significant: true,
        thresholds: opts.thresholds(),
        selection: SelectionReason::ConstantFallback,
        shapes,
        coefficients: vec![mean],
        breakpoints: Vec::new(),
    }
}
