//! Breakpoint grid generation.
//!
//! Changepoints are found by a deterministic grid search rather than nonlinear
//! optimization:
//!
//! - candidates are the distinct observed temperatures strictly inside the
//!   observed range, or a fixed-step grid when one is configured
//! - large grids are thinned evenly to `max_grid_points` so the two-breakpoint
//!   scan stays bounded
//! - a local refinement grid subdivides the gaps on either side of the coarse
//!   optimum

use crate::domain::Observations;

/// Coarse candidate breakpoints, ascending, all strictly inside `(t_min, t_max)`.
pub fn candidate_breakpoints(
    obs: &Observations,
    step: Option<f64>,
    max_points: usize,
) -> Vec<f64> {
    match step {
        None => {
            let mut distinct: Vec<f64> = obs
                .temperature()
                .iter()
                .copied()
                .filter(|&t| obs.is_interior(t))
                .collect();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            thin_indices(distinct.len(), max_points)
                .into_iter()
                .map(|i| distinct[i])
                .collect()
        }
        Some(step) => step_grid(obs, step, max_points),
    }
}

/// `t_min + k * step` for every `k >= 1` that lands inside the range, thinned
/// without materializing the full grid.
fn step_grid(obs: &Observations, step: f64, max_points: usize) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0) || !(obs.t_range() > 0.0) {
        return Vec::new();
    }
    let span = obs.t_range() / step;
    if !span.is_finite() {
        return Vec::new();
    }
    // Upper bound on k; the interior filter drops a point that lands on t_max.
    let count = span.ceil() as usize;

    thin_indices(count, max_points)
        .into_iter()
        .map(|i| obs.t_min() + (i + 1) as f64 * step)
        .filter(|&t| obs.is_interior(t))
        .collect()
}

/// Evenly spaced indices into `0..len`, at most `max` of them, keeping both ends.
pub fn thin_indices(len: usize, max: usize) -> Vec<usize> {
    if len <= max {
        return (0..len).collect();
    }
    if max == 0 {
        return Vec::new();
    }
    if max == 1 {
        return vec![len / 2];
    }
    let last = (len - 1) as f64;
    let denom = (max - 1) as f64;
    let mut out: Vec<usize> = (0..max)
        .map(|i| ((i as f64) * last / denom).round() as usize)
        .collect();
    out.dedup();
    out
}

/// Ordered `(heating, cooling)` pairs with heating strictly below cooling.
pub fn breakpoint_pairs(heating: &[f64], cooling: &[f64]) -> Vec<[f64; 2]> {
    let mut out = Vec::new();
    for &h in heating {
        for &c in cooling {
            if h < c {
                out.push([h, c]);
            }
        }
    }
    out
}

/// Refinement values for one breakpoint axis.
///
/// Subdivides the gap to the neighbouring coarse candidate on each side of
/// `best` into `steps` parts. Where `best` is the first or last coarse
/// candidate the range edge (`lower`/`upper`) stands in for the missing
/// neighbour; the edges themselves are never returned. The result is ascending
/// and includes `best`.
pub fn refine_axis(coarse: &[f64], best: f64, steps: usize, lower: f64, upper: f64) -> Vec<f64> {
    if steps == 0 {
        return vec![best];
    }
    let idx = coarse.iter().position(|&c| c == best);
    let below = idx
        .and_then(|i| i.checked_sub(1))
        .map(|i| coarse[i])
        .unwrap_or(lower);
    let above = idx
        .and_then(|i| coarse.get(i + 1).copied())
        .unwrap_or(upper);

    let steps_f = steps as f64;
    let mut out = Vec::with_capacity(2 * steps);
    for k in 1..steps {
        let t = below + (best - below) * (k as f64) / steps_f;
        if t > lower {
            out.push(t);
        }
    }
    out.push(best);
    for k in 1..steps {
        let t = best + (above - best) * (k as f64) / steps_f;
        if t < upper {
            out.push(t);
        }
    }
    out
}
