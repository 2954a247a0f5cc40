//! Model evaluation for 1P / 3P-H / 3P-C / 5P.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given temperature and breakpoints (for OLS)
//! - predict usage given coefficients and breakpoints (for residuals and results)
//!
//! Coefficient layout is `[baseload, heating_slope?, cooling_slope?]` and
//! breakpoint layout is `[heating_changepoint?, cooling_changepoint?]`, keeping
//! only the entries the shape has.

use crate::domain::ModelShape;

/// Heating hinge: negative below the changepoint, zero above.
pub fn heating_basis(t: f64, changepoint: f64) -> f64 {
    (t - changepoint).min(0.0)
}

/// Cooling hinge: zero below the changepoint, positive above.
pub fn cooling_basis(t: f64, changepoint: f64) -> f64 {
    (t - changepoint).max(0.0)
}

/// Fill a design row for the given shape.
///
/// The row includes the constant term first (baseload).
///
/// # Panics
/// Panics if `out` does not have length `shape.coefficient_len()` or
/// `breakpoints` does not have length `shape.breakpoint_count()`.
pub fn fill_design_row(shape: ModelShape, t: f64, breakpoints: &[f64], out: &mut [f64]) {
    out[0] = 1.0;
    match shape {
        ModelShape::ConstantOnly => {}
        ModelShape::HeatingOnly => {
            out[1] = heating_basis(t, breakpoints[0]);
        }
        ModelShape::CoolingOnly => {
            out[1] = cooling_basis(t, breakpoints[0]);
        }
        ModelShape::HeatingAndCooling => {
            out[1] = heating_basis(t, breakpoints[0]);
            out[2] = cooling_basis(t, breakpoints[1]);
        }
    }
}

/// Predict usage at temperature `t`.
pub fn predict(shape: ModelShape, t: f64, coefficients: &[f64], breakpoints: &[f64]) -> f64 {
    match shape {
        ModelShape::ConstantOnly => coefficients[0],
        ModelShape::HeatingOnly => {
            coefficients[0] + coefficients[1] * heating_basis(t, breakpoints[0])
        }
        ModelShape::CoolingOnly => {
            coefficients[0] + coefficients[1] * cooling_basis(t, breakpoints[0])
        }
        ModelShape::HeatingAndCooling => {
            coefficients[0]
                + coefficients[1] * heating_basis(t, breakpoints[0])
                + coefficients[2] * cooling_basis(t, breakpoints[1])
        }
    }
}

/// A single hinge term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hinge {
    pub changepoint: f64,
    pub slope: f64,
}

/// Named view of a coefficient/breakpoint pair of slices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTerms {
    pub baseload: f64,
    pub heating: Option<Hinge>,
    pub cooling: Option<Hinge>,
}

/// Split flat coefficient/breakpoint slices into named terms.
pub fn terms(shape: ModelShape, coefficients: &[f64], breakpoints: &[f64]) -> ModelTerms {
    let baseload = coefficients[0];
    match shape {
        ModelShape::ConstantOnly => ModelTerms {
            baseload,
            heating: None,
            cooling: None,
        },
        ModelShape::HeatingOnly => ModelTerms {
            baseload,
            heating: Some(Hinge {
                changepoint: breakpoints[0],
                slope: coefficients[1],
            }),
            cooling: None,
        },
        ModelShape::CoolingOnly => ModelTerms {
            baseload,
            heating: None,
            cooling: Some(Hinge {
                changepoint: breakpoints[0],
                slope: coefficients[1],
            }),
        },
        ModelShape::HeatingAndCooling => ModelTerms {
            baseload,
            heating: Some(Hinge {
                changepoint: breakpoints[0],
                slope: coefficients[1],
            }),
            cooling: Some(Hinge {
                changepoint: breakpoints[1],
                slope: coefficients[2],
            }),
        },
    }
}

/// Observation counts per regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegimeCounts {
    /// Strictly below the heating changepoint.
    pub heating: usize,
    /// Between the changepoints (inclusive).
    pub baseload: usize,
    /// Strictly above the cooling changepoint.
    pub cooling: usize,
}

/// Partition temperatures into regimes for the given shape and breakpoints.
pub fn count_regimes(shape: ModelShape, temperatures: &[f64], breakpoints: &[f64]) -> RegimeCounts {
    let (heating_cp, cooling_cp) = match shape {
        ModelShape::ConstantOnly => (None, None),
        ModelShape::HeatingOnly => (Some(breakpoints[0]), None),
        ModelShape::CoolingOnly => (None, Some(breakpoints[0])),
        ModelShape::HeatingAndCooling => (Some(breakpoints[0]), Some(breakpoints[1])),
    };

    let mut counts = RegimeCounts::default();
    for &t in temperatures {
        if heating_cp.is_some_and(|cp| t < cp) {
            counts.heating += 1;
        } else if cooling_cp.is_some_and(|cp| t > cp) {
            counts.cooling += 1;
        } else {
            counts.baseload += 1;
        }
    }
    counts
}
