//! Breakpoint search for a single shape.
//!
//! Given a shape, we:
//! - build the coarse candidate grid (one axis per breakpoint)
//! - evaluate every candidate and keep the best by R²
//! - rescan a finer grid around the coarse optimum
//!
//! Selection among candidates is deterministic: among the candidates within
//! `tie_tolerance` of the highest R², the `TieBreak` policy decides and exact
//! ties keep the earlier candidate in scan order.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::domain::{CandidateFit, FitOptions, ModelShape, Observations, TieBreak};
use crate::error::FitError;
use crate::fit::evaluator::{check_series, evaluate};
use crate::fit::grid::{breakpoint_pairs, candidate_breakpoints, refine_axis};

/// Best candidate for `shape`.
///
/// Fails with `InsufficientData` when the series is too short for the shape,
/// with the series-level `DegenerateFit` when usage cannot be scored at all,
/// and with `NoFeasibleBreakpoint` when every candidate was rejected.
pub fn search_shape(
    obs: &Observations,
    shape: ModelShape,
    opts: &FitOptions,
) -> Result<CandidateFit, FitError> {
    let needed = shape.min_observations(opts.regime_min());
    if obs.len() < needed {
        return Err(FitError::InsufficientData {
            shape,
            needed,
            got: obs.len(),
        });
    }
    check_series(obs)?;

    if shape.breakpoint_count() == 0 {
        return evaluate(obs, shape, &[], opts);
    }

    let coarse = candidate_breakpoints(obs, opts.breakpoint_grid_step, opts.max_grid_points);
    let grid = breakpoint_grid(shape, &coarse, &coarse);
    trace!(shape = %shape, axis = coarse.len(), candidates = grid.len(), "coarse breakpoint grid");

    let mut scan = Scan::new(obs, opts);
    for bps in &grid {
        scan.offer(evaluate(obs, shape, bps, opts));
    }

    let Some(coarse_best) = scan.best().map(|c| c.breakpoints.clone()) else {
        debug!(shape = %shape, rejected = scan.rejected, "no feasible breakpoint");
        return Err(FitError::NoFeasibleBreakpoint(shape));
    };

    if opts.refine_steps > 0 {
        let axes: Vec<Vec<f64>> = coarse_best
            .iter()
            .map(|&bp| refine_axis(&coarse, bp, opts.refine_steps, obs.t_min(), obs.t_max()))
            .collect();
        let fine = match axes.as_slice() {
            [axis] => breakpoint_grid(shape, axis, axis),
            [heating, cooling] => breakpoint_grid(shape, heating, cooling),
            _ => Vec::new(),
        };
        trace!(shape = %shape, candidates = fine.len(), "refinement grid");
        for bps in &fine {
            scan.offer(evaluate(obs, shape, bps, opts));
        }
    }

    let rejected = scan.rejected;
    let best = scan
        .into_best()
        .ok_or(FitError::NoFeasibleBreakpoint(shape))?;
    debug!(
        shape = %shape,
        breakpoints = ?best.breakpoints,
        r_squared = best.r_squared,
        cvrmse = best.cvrmse,
        rejected,
        "shape search finished"
    );
    Ok(best)
}

fn breakpoint_grid(shape: ModelShape, heating: &[f64], cooling: &[f64]) -> Vec<Vec<f64>> {
    match shape {
        ModelShape::ConstantOnly => vec![Vec::new()],
        ModelShape::HeatingOnly => heating.iter().map(|&h| vec![h]).collect(),
        ModelShape::CoolingOnly => cooling.iter().map(|&c| vec![c]).collect(),
        ModelShape::HeatingAndCooling => breakpoint_pairs(heating, cooling)
            .into_iter()
            .map(|pair| pair.to_vec())
            .collect(),
    }
}

/// Best-so-far accumulator over candidates in scan order.
///
/// Keeps the highest R² seen and the candidates within `tie_tolerance` of it
/// that no other kept candidate beats on both R² and tie-break order. The
/// winner is drawn from that pool only once the maximum is known, so a chain
/// of near-ties can never walk away from the best fit.
struct Scan<'a> {
    opts: &'a FitOptions,
    median: f64,
    max_r_squared: f64,
    pool: Vec<CandidateFit>,
    rejected: usize,
}

impl<'a> Scan<'a> {
    fn new(obs: &Observations, opts: &'a FitOptions) -> Self {
        Self {
            opts,
            median: obs.t_median(),
            max_r_squared: f64::NEG_INFINITY,
            pool: Vec::new(),
            rejected: 0,
        }
    }

    fn offer(&mut self, candidate: Result<CandidateFit, FitError>) {
        let candidate = match candidate {
            Ok(c) => c,
            Err(_) => {
                self.rejected += 1;
                return;
            }
        };

        let tol = self.opts.tie_tolerance;
        self.max_r_squared = self.max_r_squared.max(candidate.r_squared);
        let floor = self.max_r_squared - tol;
        if candidate.r_squared < floor {
            return;
        }
        self.pool.retain(|kept| kept.r_squared >= floor);

        // Earlier candidates win exact tie-break ties.
        let dominated = self.pool.iter().any(|kept| {
            kept.r_squared >= candidate.r_squared
                && self.tie_order(kept, &candidate) != Ordering::Greater
        });
        if dominated {
            return;
        }
        let (opts, median) = (self.opts, self.median);
        self.pool.retain(|kept| {
            !(candidate.r_squared >= kept.r_squared
                && tie_order(opts.tie_break, median, &candidate, kept) == Ordering::Less)
        });
        self.pool.push(candidate);
    }

    /// `Less` when `a` goes before `b` under the tie-break policy.
    fn tie_order(&self, a: &CandidateFit, b: &CandidateFit) -> Ordering {
        tie_order(self.opts.tie_break, self.median, a, b)
    }

    fn best_index(&self) -> Option<usize> {
        (0..self.pool.len()).reduce(|best, i| {
            if self.tie_order(&self.pool[i], &self.pool[best]) == Ordering::Less {
                i
            } else {
                best
            }
        })
    }

    fn best(&self) -> Option<&CandidateFit> {
        self.best_index().map(|i| &self.pool[i])
    }

    fn into_best(mut self) -> Option<CandidateFit> {
        let i = self.best_index()?;
        Some(self.pool.swap_remove(i))
    }
}

fn tie_order(policy: TieBreak, median: f64, a: &CandidateFit, b: &CandidateFit) -> Ordering {
    match policy {
        TieBreak::NearestMedian => median_distance(&a.breakpoints, median)
            .total_cmp(&median_distance(&b.breakpoints, median)),
        TieBreak::LowestTemperature => a
            .breakpoints
            .iter()
            .zip(&b.breakpoints)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal),
    }
}

fn median_distance(breakpoints: &[f64], median: f64) -> f64 {
    breakpoints.iter().map(|bp| (bp - median).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario_a() -> Observations {
        Observations::new(
            &[30.0, 40.0, 50.0, 60.0, 70.0, 80.0],
            &[100.0, 90.0, 70.0, 60.0, 65.0, 85.0],
        )
        .unwrap()
    }

    #[test]
    fn refinement_improves_on_coarse_grid() {
        let obs = scenario_a();
        let coarse_only = FitOptions {
            min_points_per_regime: 2,
            refine_steps: 0,
            ..FitOptions::default()
        };
        let refined = FitOptions {
            min_points_per_regime: 2,
            ..FitOptions::default()
        };

        let coarse = search_shape(&obs, ModelShape::HeatingAndCooling, &coarse_only).unwrap();
        assert_eq!(coarse.breakpoints, vec![50.0, 60.0]);

        let fine = search_shape(&obs, ModelShape::HeatingAndCooling, &refined).unwrap();
        assert!(fine.r_squared > coarse.r_squared);
        assert!(fine.breakpoints[0] >= 50.0 && fine.breakpoints[0] <= 60.0);
        assert!(fine.breakpoints[1] >= 60.0 && fine.breakpoints[1] <= 70.0);
    }

    #[test]
    fn finds_exact_cooling_changepoint() {
        let temps: Vec<f64> = (30..=80).map(f64::from).collect();
        let usage: Vec<f64> = temps.iter().map(|&t| 40.0 + 1.5 * (t - 62.0).max(0.0)).collect();
        let obs = Observations::new(&temps, &usage).unwrap();

        let fit = search_shape(&obs, ModelShape::CoolingOnly, &FitOptions::default()).unwrap();
        assert_relative_eq!(fit.breakpoints[0], 62.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[1], 1.5, epsilon = 1e-9);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn short_series_is_insufficient() {
        let obs = Observations::new(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        let err = search_shape(&obs, ModelShape::HeatingOnly, &FitOptions::default()).unwrap_err();
        assert_eq!(
            err,
            FitError::InsufficientData {
                shape: ModelShape::HeatingOnly,
                needed: 6,
                got: 3
            }
        );
    }

    #[test]
    fn no_feasible_breakpoint_when_every_candidate_fails() {
        // Usage falls as temperature rises: every cooling hinge fits a negative slope.
        let temps: Vec<f64> = (0..12).map(|i| 30.0 + 5.0 * i as f64).collect();
        let usage: Vec<f64> = temps.iter().map(|&t| 200.0 - t).collect();
        let obs = Observations::new(&temps, &usage).unwrap();

        let err = search_shape(&obs, ModelShape::CoolingOnly, &FitOptions::default()).unwrap_err();
        assert_eq!(err, FitError::NoFeasibleBreakpoint(ModelShape::CoolingOnly));
    }

    fn candidate(breakpoint: f64, r_squared: f64) -> CandidateFit {
        CandidateFit {
            shape: ModelShape::HeatingOnly,
            breakpoints: vec![breakpoint],
            coefficients: vec![5.0, -0.1],
            fitted: Vec::new(),
            residuals: Vec::new(),
            sse: 1.0,
            rmse: 0.3,
            r_squared,
            cvrmse: 0.05,
            n: 9,
            heating: None,
            cooling: None,
        }
    }

    fn nine_point_obs() -> Observations {
        let temps = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];
        let usage = [9.0, 8.0, 7.0, 6.0, 5.0, 5.0, 5.0, 5.0, 5.0];
        Observations::new(&temps, &usage).unwrap()
    }

    #[test]
    fn tie_break_policies_order_equal_candidates() {
        let obs = nine_point_obs();
        let far = candidate(30.0, 0.7);
        let near = candidate(45.0, 0.7);

        let nearest = FitOptions::default();
        let scan = Scan::new(&obs, &nearest);
        assert_eq!(scan.tie_order(&near, &far), Ordering::Less);
        assert_eq!(scan.tie_order(&far, &near), Ordering::Greater);

        let lowest = FitOptions {
            tie_break: TieBreak::LowestTemperature,
            ..FitOptions::default()
        };
        let scan = Scan::new(&obs, &lowest);
        assert_eq!(scan.tie_order(&far, &near), Ordering::Less);
    }

    #[test]
    fn clearly_better_fit_wins_regardless_of_policy() {
        let obs = nine_point_obs();
        let opts = FitOptions::default();
        let mut scan = Scan::new(&obs, &opts);
        scan.offer(Ok(candidate(50.0, 0.7)));
        scan.offer(Ok(candidate(80.0, 0.8)));
        assert_eq!(scan.into_best().unwrap().breakpoints, vec![80.0]);
    }

    #[test]
    fn near_tie_chain_stays_within_tolerance_of_best() {
        // Each candidate is within tolerance of the previous one and closer to
        // the median (50), but only the first two are within tolerance of the best.
        let obs = nine_point_obs();
        let opts = FitOptions::default();
        let tol = opts.tie_tolerance;
        let mut scan = Scan::new(&obs, &opts);
        for (i, bp) in [20.0, 30.0, 40.0, 50.0].into_iter().enumerate() {
            scan.offer(Ok(candidate(bp, 0.9 - 0.9 * tol * i as f64)));
        }
        scan.offer(Err(FitError::NoFeasibleBreakpoint(ModelShape::HeatingOnly)));

        assert_eq!(scan.rejected, 1);
        let best = scan.into_best().unwrap();
        assert_eq!(best.breakpoints, vec![30.0]);
        assert!(0.9 - best.r_squared <= tol);
    }

    #[test]
    fn exact_ties_keep_the_earlier_candidate() {
        let obs = nine_point_obs();
        let opts = FitOptions::default();
        let mut scan = Scan::new(&obs, &opts);
        // Both 40 and 60 are 10 degrees from the median.
        scan.offer(Ok(candidate(40.0, 0.7)));
        scan.offer(Ok(candidate(60.0, 0.7)));
        assert_eq!(scan.into_best().unwrap().breakpoints, vec![40.0]);
    }

    #[test]
    fn search_applies_tie_break_across_tied_grid_candidates() {
        // Every feasible heating changepoint ties under a wide tolerance, so the
        // policy alone picks among the grid candidates 33..=79.
        let temps: Vec<f64> = (30..=80).map(f64::from).collect();
        let usage: Vec<f64> = temps.iter().map(|&t| 40.0 + 1.5 * (62.0 - t).max(0.0)).collect();
        let obs = Observations::new(&temps, &usage).unwrap();
        let nearest = FitOptions {
            tie_tolerance: 1.0,
            refine_steps: 0,
            ..FitOptions::default()
        };

        let fit = search_shape(&obs, ModelShape::HeatingOnly, &nearest).unwrap();
        assert_eq!(fit.breakpoints, vec![obs.t_median()]);
        assert_eq!(fit.breakpoints, vec![55.0]);

        let lowest = FitOptions {
            tie_break: TieBreak::LowestTemperature,
            ..nearest
        };
        let fit = search_shape(&obs, ModelShape::HeatingOnly, &lowest).unwrap();
        // Three heating points are needed below the changepoint.
        assert_eq!(fit.breakpoints, vec![33.0]);
    }

    #[test]
    fn capped_grid_still_finds_interior_changepoint() {
        let temps: Vec<f64> = (0..=500).map(|i| 30.0 + 0.1 * i as f64).collect();
        let usage: Vec<f64> = temps.iter().map(|&t| 40.0 + 2.0 * (55.0 - t).max(0.0)).collect();
        let obs = Observations::new(&temps, &usage).unwrap();
        let opts = FitOptions {
            max_grid_points: 5,
            ..FitOptions::default()
        };

        assert_eq!(candidate_breakpoints(&obs, None, opts.max_grid_points).len(), 5);
        let fit = search_shape(&obs, ModelShape::HeatingOnly, &opts).unwrap();
        let cp = fit.breakpoints[0];
        assert!(obs.is_interior(cp));
        assert!((cp - 55.0).abs() < 2.5, "cp = {cp}");
        assert!(fit.r_squared > 0.99);
    }

    #[test]
    fn search_is_deterministic() {
        let obs = scenario_a();
        let opts = FitOptions {
            min_points_per_regime: 2,
            ..FitOptions::default()
        };
        let a = search_shape(&obs, ModelShape::HeatingAndCooling, &opts).unwrap();
        let b = search_shape(&obs, ModelShape::HeatingAndCooling, &opts).unwrap();
        assert_eq!(a.breakpoints, b.breakpoints);
        assert_eq!(a.coefficients, b.coefficients);
    }
}
