//! Segment evaluator: one shape at one set of fixed breakpoints.
//!
//! Given the breakpoints, the change-point model is linear in its
//! coefficients, so each candidate is:
//!
//! - partition observations into heating / baseload / cooling regimes
//! - build the hinge design matrix and solve OLS for baseload + slopes
//! - reject slopes that break the sign convention
//! - score the fit (R², CV-RMSE) and test each slope over its regime subset
//!
//! Every rejection is a `FitError` value; nothing here panics or logs.

use nalgebra::{DMatrix, DVector};

use crate::domain::{CandidateFit, FitOptions, ModelShape, Observations, SlopeStats};
use crate::error::{DegenerateKind, FitError, Regime};
use crate::math::{
    cvrmse, is_negligible_effect, is_zero_mean, is_zero_variance, r_squared, slope_p_value,
    solve_least_squares,
};
use crate::models::{count_regimes, fill_design_row, predict};

/// Series-level conditions under which no shape can be scored.
pub fn check_series(obs: &Observations) -> Result<(), FitError> {
    if is_zero_variance(obs.ss_total(), obs.usage_mean(), obs.len()) {
        return Err(FitError::DegenerateFit(DegenerateKind::ZeroVariance));
    }
    if is_zero_mean(obs.usage_mean(), obs.usage()) {
        return Err(FitError::DegenerateFit(DegenerateKind::ZeroMeanUsage));
    }
    Ok(())
}

/// Evaluate `shape` with the given breakpoints (heating first).
pub fn evaluate(
    obs: &Observations,
    shape: ModelShape,
    breakpoints: &[f64],
    opts: &FitOptions,
) -> Result<CandidateFit, FitError> {
    check_series(obs)?;
    check_breakpoints(obs, shape, breakpoints)?;
    check_regimes(obs, shape, breakpoints, opts.regime_min())?;

    let temps = obs.temperature();
    let usage = obs.usage();
    let n = obs.len();
    let p = shape.coefficient_len();

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &t) in temps.iter().enumerate() {
        fill_design_row(shape, t, breakpoints, &mut row);
        for (j, &v) in row.iter().enumerate() {
            x[(i, j)] = v;
        }
    }
    let y = DVector::from_column_slice(usage);

    let beta = solve_least_squares(&x, &y).map_err(FitError::DegenerateFit)?;
    let coefficients: Vec<f64> = beta.iter().copied().collect();

    let (heating_slope, cooling_slope) = slopes(shape, &coefficients);
    if let Some(slope) = heating_slope {
        if slope > 0.0 {
            return Err(FitError::InvalidSlopeSign {
                regime: Regime::Heating,
                slope,
            });
        }
    }
    if let Some(slope) = cooling_slope {
        if slope < 0.0 {
            return Err(FitError::InvalidSlopeSign {
                regime: Regime::Cooling,
                slope,
            });
        }
    }

    let fitted: Vec<f64> = temps
        .iter()
        .map(|&t| predict(shape, t, &coefficients, breakpoints))
        .collect();
    let residuals: Vec<f64> = usage.iter().zip(&fitted).map(|(y, f)| y - f).collect();
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let rmse = (sse / n as f64).sqrt();
    let r2 = r_squared(sse, obs.ss_total());
    let cv = cvrmse(rmse, obs.usage_mean());
    if !(sse.is_finite() && r2.is_finite() && cv.is_finite()) {
        return Err(FitError::DegenerateFit(DegenerateKind::NonFinite));
    }

    let heating = heating_slope.map(|slope| {
        let cp = breakpoints[0];
        slope_stats(obs, &fitted, slope, Regime::Heating, opts, |t| t <= cp)
    });
    let cooling = cooling_slope.map(|slope| {
        let cp = breakpoints[breakpoints.len() - 1];
        slope_stats(obs, &fitted, slope, Regime::Cooling, opts, |t| t >= cp)
    });

    Ok(CandidateFit {
        shape,
        breakpoints: breakpoints.to_vec(),
        coefficients,
        fitted,
        residuals,
        sse,
        rmse,
        r_squared: r2,
        cvrmse: cv,
        n,
        heating,
        cooling,
    })
}

fn check_breakpoints(
    obs: &Observations,
    shape: ModelShape,
    breakpoints: &[f64],
) -> Result<(), FitError> {
    if breakpoints.len() != shape.breakpoint_count() {
        return Err(FitError::InvalidInput(format!(
            "{shape} takes {} breakpoint(s), got {}",
            shape.breakpoint_count(),
            breakpoints.len()
        )));
    }
    if breakpoints.iter().any(|&bp| !obs.is_interior(bp)) {
        return Err(FitError::DegenerateFit(DegenerateKind::BreakpointOutOfRange));
    }
    if shape == ModelShape::HeatingAndCooling && breakpoints[0] >= breakpoints[1] {
        return Err(FitError::DegenerateFit(DegenerateKind::UnorderedBreakpoints));
    }
    Ok(())
}

fn check_regimes(
    obs: &Observations,
    shape: ModelShape,
    breakpoints: &[f64],
    regime_min: usize,
) -> Result<(), FitError> {
    let counts = count_regimes(shape, obs.temperature(), breakpoints);
    let insufficient = |needed: usize, got: usize| FitError::InsufficientData { shape, needed, got };

    if shape.has_heating() && counts.heating < regime_min {
        return Err(insufficient(regime_min, counts.heating));
    }
    if shape.has_cooling() && counts.cooling < regime_min {
        return Err(insufficient(regime_min, counts.cooling));
    }
    if counts.baseload < 1 {
        return Err(insufficient(1, counts.baseload));
    }
    Ok(())
}

fn slopes(shape: ModelShape, coefficients: &[f64]) -> (Option<f64>, Option<f64>) {
    match shape {
        ModelShape::ConstantOnly => (None, None),
        ModelShape::HeatingOnly => (Some(coefficients[1]), None),
        ModelShape::CoolingOnly => (None, Some(coefficients[1])),
        ModelShape::HeatingAndCooling => (Some(coefficients[1]), Some(coefficients[2])),
    }
}

fn slope_stats(
    obs: &Observations,
    fitted: &[f64],
    slope: f64,
    regime: Regime,
    opts: &FitOptions,
    in_subset: impl Fn(f64) -> bool,
) -> SlopeStats {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut f = Vec::new();
    for ((&t, &u), &fit) in obs.temperature().iter().zip(obs.usage()).zip(fitted) {
        if in_subset(t) {
            x.push(t);
            y.push(u);
            f.push(fit);
        }
    }

    let p_value = slope_p_value(&x, &y, &f, slope);
    let sign_ok = match regime {
        Regime::Heating => slope <= 0.0,
        Regime::Cooling => slope >= 0.0,
    };

    SlopeStats {
        slope,
        p_value,
        significant: p_value.is_some_and(|p| p < opts.significance_level),
        plausible: sign_ok && !is_negligible_effect(slope, obs.t_range(), obs.usage_mean()),
    }
}
