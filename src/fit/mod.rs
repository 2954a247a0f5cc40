//! Change-point fitting orchestration.
//!
//! Responsibilities:
//!
//! - validate options and observations
//! - search breakpoints for every requested shape ([`search`])
//! - pick one shape across the candidates ([`selection`])
//! - assemble the immutable [`FitResult`], falling back to a constant model
//!   when no shape could be fitted ([`assemble`])

pub mod assemble;
pub mod evaluator;
pub mod grid;
pub mod search;
pub mod selection;

use tracing::debug;

use crate::domain::{FitOptions, FitResult, ModelShape, Observations, ShapeOutcome, ShapeStatus};
use crate::error::FitError;

pub use assemble::{assemble, constant_fallback};
pub use search::search_shape;
pub use selection::select_shape;

/// Fit a change-point model of usage against temperature.
///
/// Tries every shape in `options.shapes_to_try` whose minimum observation count
/// is met and returns the selected model. Shapes that cannot be fitted are
/// recorded in [`FitResult::shapes`]; when none can be fitted the result is a
/// mean-usage constant model that is never valid.
///
/// # Errors
/// - `InvalidOptions` for out-of-range options
/// - `InvalidInput` for mismatched lengths or non-finite values
/// - `NoFeasibleModel` for an empty series
pub fn fit(
    temperatures: &[f64],
    usage: &[f64],
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    options.validate()?;
    let obs = Observations::new(temperatures, usage)?;

    let mut fits = Vec::new();
    let mut outcomes = Vec::new();
    let thresholds = options.thresholds();

    for shape in ModelShape::ALL {
        if !options.shapes_to_try.contains(&shape) {
            continue;
        }
        match search_shape(&obs, shape, options) {
            Ok(candidate) => {
                outcomes.push(ShapeOutcome {
                    shape,
                    status: ShapeStatus::Fitted {
                        r_squared: candidate.r_squared,
                        cvrmse: candidate.cvrmse,
                        breakpoints: candidate.breakpoints.clone(),
                        qualifies: candidate.qualifies(&thresholds),
                    },
                });
                fits.push(candidate);
            }
            Err(reason) => {
                debug!(shape = %shape, %reason, "shape skipped");
                outcomes.push(ShapeOutcome {
                    shape,
                    status: ShapeStatus::Skipped { reason },
                });
            }
        }
    }

    match select_shape(&fits, &thresholds) {
        Some((i, reason)) => {
            debug!(shape = %fits[i].shape, ?reason, "shape selected");
            Ok(assemble(&fits[i], reason, options, outcomes))
        }
        None => {
            debug!(n = obs.len(), "no shape fitted; using constant fallback");
            Ok(constant_fallback(&obs, options, outcomes))
        }
    }
}
