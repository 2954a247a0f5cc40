//! Export fit results.
//!
//! - fit JSON: the `FitResult` plus a precomputed fitted grid for quick plotting
//! - residual CSV: one row per observation (see `report::residual_rows`)

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::FitResult;
use crate::error::AppError;
use crate::report::ResidualRow;

/// Number of points in the exported prediction grid.
pub const GRID_POINTS: usize = 101;

/// Portable JSON representation of a fit.
#[derive(Debug, Clone, Serialize)]
pub struct FitFile<'a> {
    pub tool: &'static str,
    pub source: Option<String>,
    pub label: &'static str,
    pub long_label: &'static str,
    pub complexity: usize,
    pub valid: bool,
    pub model: &'a FitResult,
    pub grid: FitGrid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitGrid {
    pub temperature: Vec<f64>,
    pub usage: Vec<f64>,
}

/// Evenly spaced predictions over `[t_min, t_max]`.
pub fn build_grid(result: &FitResult, t_min: f64, t_max: f64, n: usize) -> FitGrid {
    let n = n.max(2);
    let mut t0 = t_min;
    let mut t1 = t_max;
    if !(t0.is_finite() && t1.is_finite()) || t1 < t0 {
        t0 = 0.0;
        t1 = 100.0;
    }
    if (t1 - t0).abs() < 1e-9 {
        t0 -= 0.5;
        t1 += 0.5;
    }

    let temperature: Vec<f64> = (0..n)
        .map(|i| t0 + (i as f64 / (n as f64 - 1.0)) * (t1 - t0))
        .collect();
    let usage = result.fitted_values(&temperature);
    FitGrid { temperature, usage }
}

/// Write the fit JSON file.
pub fn write_fit_json(
    path: &Path,
    result: &FitResult,
    source: Option<String>,
    t_min: f64,
    t_max: f64,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    let fit_file = FitFile {
        tool: "cpm",
        source,
        label: result.label(),
        long_label: result.long_label(),
        complexity: result.complexity(),
        valid: result.is_valid(),
        model: result,
        grid: build_grid(result, t_min, t_max, GRID_POINTS),
    };

    serde_json::to_writer_pretty(file, &fit_file)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Write per-observation residuals to a CSV file.
pub fn write_residuals_csv(path: &Path, rows: &[ResidualRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create residual CSV '{}': {e}", path.display()),
        )
    })?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write residual CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush residual CSV: {e}")))?;
    Ok(())
}
