//! Cross-shape model selection.
//!
//! Rules:
//! 1. A shape qualifies when it clears every threshold in `Thresholds`
//!    (R², CV-RMSE, plausible slopes, and significant slopes when required).
//! 2. Among qualifying shapes the most complex wins (5P > 3P > 1P); between the
//!    two 3P shapes the higher R² wins, heating first on exact ties.
//! 3. If nothing qualifies, the highest-R² shape is returned as a best effort,
//!    the simpler shape on exact ties.

use crate::domain::{CandidateFit, SelectionReason, Thresholds};

/// Index of the chosen fit and why it was chosen.
///
/// `fits` must be ordered simplest first (the `ModelShape::ALL` order); the
/// scan relies on that order for its tie rules. Returns `None` when `fits` is
/// empty.
pub fn select_shape(
    fits: &[CandidateFit],
    thresholds: &Thresholds,
) -> Option<(usize, SelectionReason)> {
    let mut qualified: Option<usize> = None;
    for (i, fit) in fits.iter().enumerate() {
        if !fit.qualifies(thresholds) {
            continue;
        }
        let better = match qualified {
            None => true,
            Some(j) => {
                let best = &fits[j];
                let rank = fit.shape.complexity_rank();
                let best_rank = best.shape.complexity_rank();
                rank > best_rank || (rank == best_rank && fit.r_squared > best.r_squared)
            }
        };
        if better {
            qualified = Some(i);
        }
    }
    if let Some(i) = qualified {
        return Some((i, SelectionReason::MeetsThresholds));
    }

    let mut best: Option<usize> = None;
    for (i, fit) in fits.iter().enumerate() {
        if best.is_none_or(|j| fit.r_squared > fits[j].r_squared) {
            best = Some(i);
        }
    }
    best.map(|i| (i, SelectionReason::BestEffort))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelShape, SlopeStats};

    fn slope(value: f64) -> SlopeStats {
        SlopeStats {
            slope: value,
            p_value: Some(0.01),
            significant: true,
            plausible: true,
        }
    }

    fn candidate(shape: ModelShape, r_squared: f64, cvrmse: f64) -> CandidateFit {
        CandidateFit {
            shape,
            breakpoints: vec![50.0; shape.breakpoint_count()],
            coefficients: vec![1.0; shape.coefficient_len()],
            fitted: Vec::new(),
            residuals: Vec::new(),
            sse: 0.0,
            rmse: 0.0,
            r_squared,
            cvrmse,
            n: 20,
            heating: shape.has_heating().then(|| slope(-1.0)),
            cooling: shape.has_cooling().then(|| slope(1.0)),
        }
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            min_r_squared: 0.6,
            max_cvrmse: 0.5,
            require_significant_slopes: false,
        }
    }

    #[test]
    fn most_complex_qualifying_shape_wins() {
        let fits = vec![
            candidate(ModelShape::ConstantOnly, 0.0, 0.4),
            candidate(ModelShape::HeatingOnly, 0.95, 0.05),
            candidate(ModelShape::HeatingAndCooling, 0.7, 0.2),
        ];
        let (i, reason) = select_shape(&fits, &thresholds()).unwrap();
        assert_eq!(fits[i].shape, ModelShape::HeatingAndCooling);
        assert_eq!(reason, SelectionReason::MeetsThresholds);
    }

    #[test]
    fn three_parameter_shapes_compare_by_r_squared() {
        let fits = vec![
            candidate(ModelShape::HeatingOnly, 0.8, 0.1),
            candidate(ModelShape::CoolingOnly, 0.9, 0.1),
        ];
        let (i, _) = select_shape(&fits, &thresholds()).unwrap();
        assert_eq!(fits[i].shape, ModelShape::CoolingOnly);

        let tied = vec![
            candidate(ModelShape::HeatingOnly, 0.9, 0.1),
            candidate(ModelShape::CoolingOnly, 0.9, 0.1),
        ];
        let (i, _) = select_shape(&tied, &thresholds()).unwrap();
        assert_eq!(tied[i].shape, ModelShape::HeatingOnly);
    }

    #[test]
    fn implausible_slope_disqualifies() {
        let mut five = candidate(ModelShape::HeatingAndCooling, 1.0, 0.0);
        if let Some(c) = five.cooling.as_mut() {
            c.plausible = false;
        }
        let fits = vec![candidate(ModelShape::HeatingOnly, 1.0, 0.0), five];
        let (i, reason) = select_shape(&fits, &thresholds()).unwrap();
        assert_eq!(fits[i].shape, ModelShape::HeatingOnly);
        assert_eq!(reason, SelectionReason::MeetsThresholds);
    }

    #[test]
    fn significance_only_matters_when_required() {
        let mut heating = candidate(ModelShape::HeatingOnly, 0.9, 0.1);
        if let Some(h) = heating.heating.as_mut() {
            h.significant = false;
            h.p_value = Some(0.4);
        }
        let fits = vec![candidate(ModelShape::ConstantOnly, 0.0, 0.1), heating];

        let (i, reason) = select_shape(&fits, &thresholds()).unwrap();
        assert_eq!(fits[i].shape, ModelShape::HeatingOnly);
        assert_eq!(reason, SelectionReason::MeetsThresholds);

        let strict = Thresholds {
            require_significant_slopes: true,
            ..thresholds()
        };
        let (i, reason) = select_shape(&fits, &strict).unwrap();
        assert_eq!(fits[i].shape, ModelShape::HeatingOnly);
        assert_eq!(reason, SelectionReason::BestEffort);
    }

    #[test]
    fn best_effort_prefers_simpler_on_ties() {
        let fits = vec![
            candidate(ModelShape::ConstantOnly, 0.3, 0.9),
            candidate(ModelShape::HeatingOnly, 0.3, 0.9),
        ];
        let (i, reason) = select_shape(&fits, &thresholds()).unwrap();
        assert_eq!(fits[i].shape, ModelShape::ConstantOnly);
        assert_eq!(reason, SelectionReason::BestEffort);

        assert_eq!(select_shape(&[], &thresholds()), None);
    }
}
