//! Summary statistics for observation series and fitted candidates.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Relative size below which a sum of squares or a mean counts as zero.
pub const NEAR_ZERO_REL: f64 = 1e-12;

/// Slopes with a smaller magnitude carry no p-value.
pub const SLOPE_EPS: f64 = 1e-5;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; the average of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Sum of squared deviations around `center`.
pub fn sum_sq_dev(values: &[f64], center: f64) -> f64 {
    values.iter().map(|v| (v - center) * (v - center)).sum()
}

/// Whether `ss_total` is too small for R² to mean anything.
///
/// Scaled by the magnitude of the data so that a constant series of large
/// values with rounding noise still counts as zero variance.
pub fn is_zero_variance(ss_total: f64, usage_mean: f64, n: usize) -> bool {
    let scale = (usage_mean * usage_mean).max(1.0) * n.max(1) as f64;
    !(ss_total > NEAR_ZERO_REL * scale)
}

pub fn is_zero_mean(usage_mean: f64, usage: &[f64]) -> bool {
    let scale = usage.iter().fold(0.0_f64, |acc, u| acc.max(u.abs())).max(1.0);
    !(usage_mean.abs() > NEAR_ZERO_REL * scale)
}

/// `1 - sse / ss_total`, clamped to `[0, 1]`.
pub fn r_squared(sse: f64, ss_total: f64) -> f64 {
    (1.0 - sse / ss_total).clamp(0.0, 1.0)
}

/// Coefficient of variation of the RMSE.
pub fn cvrmse(rmse: f64, usage_mean: f64) -> f64 {
    rmse / usage_mean.abs()
}

/// Whether a slope's total effect across the observed range is indistinguishable
/// from zero relative to the usage level.
pub fn is_negligible_effect(slope: f64, t_range: f64, usage_mean: f64) -> bool {
    slope.abs() * t_range <= 1e-6 * usage_mean.abs().max(1.0)
}

/// Two-sided p-value of `slope` over one regime subset.
///
/// `x`, `y` and `fitted` are the subset's temperatures, observed usage and
/// model predictions. The residual variance and the t distribution use `m - 2`
/// degrees of freedom, the residual degrees of freedom of a slope-plus-intercept
/// fit over the subset. This intentionally departs from an `m - 1` convention,
/// which reports smaller p-values for the same slope near the cutoff.
/// Returns `None` for a (near) zero slope, fewer than three points, or a subset
/// without temperature spread.
pub fn slope_p_value(x: &[f64], y: &[f64], fitted: &[f64], slope: f64) -> Option<f64> {
    let m = x.len();
    if m <= 2 || slope.abs() < SLOPE_EPS || !slope.is_finite() {
        return None;
    }

    let ss_res: f64 = y
        .iter()
        .zip(fitted)
        .map(|(obs, fit)| (obs - fit) * (obs - fit))
        .sum();
    let df = (m - 2) as f64;
    let s2 = ss_res / df;

    let x_mean = mean(x)?;
    let sxx = sum_sq_dev(x, x_mean);
    if !(sxx > 0.0) {
        return None;
    }

    let se = (s2 / sxx).sqrt();
    if !se.is_finite() {
        return None;
    }
    if se == 0.0 {
        return Some(0.0);
    }

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = (2.0 * dist.sf((slope / se).abs())).clamp(0.0, 1.0);
    p.is_finite().then_some(p)
}
