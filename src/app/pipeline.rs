//! Shared "fit pipeline" logic used by every command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load or generate observations -> fit/select -> residuals
//!
//! Commands can then focus on presentation and exports.

use tracing::info;

use crate::data::{SyntheticConfig, generate_series};
use crate::domain::{FitOptions, FitResult};
use crate::error::AppError;
use crate::io::ingest::{IngestConfig, IngestedData, describe_source, load_observations};
use crate::report::{ResidualRow, residual_rows};

/// Where a run's observations come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Csv(IngestConfig),
    Synthetic(SyntheticConfig),
}

impl InputSource {
    /// Short description for reports and exports.
    pub fn describe(&self) -> String {
        match self {
            InputSource::Csv(config) => describe_source(&config.csv_path),
            InputSource::Synthetic(config) => format!(
                "synthetic {} (n={}, seed={})",
                config.shape, config.count, config.seed
            ),
        }
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub source: String,
    pub data: IngestedData,
    pub result: FitResult,
    pub residuals: Vec<ResidualRow>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(input: &InputSource, options: &FitOptions) -> Result<RunOutput, AppError> {
    // 1) Load or generate observations.
    let data = match input {
        InputSource::Csv(config) => load_observations(config)?,
        InputSource::Synthetic(config) => {
            let series = generate_series(config)?;
            IngestedData::from_series(series.temperature, series.usage)?
        }
    };
    let source = input.describe();
    info!(
        source = %source,
        rows_used = data.rows_used,
        rows_skipped = data.row_errors.len(),
        "observations loaded"
    );

    // 2) Fit every shape and select one.
    let result = crate::fit::fit(&data.temperature, &data.usage, options)?;
    info!(
        shape = %result.shape(),
        selection = ?result.selection(),
        r_squared = ?result.r_squared(),
        cvrmse = ?result.cvrmse(),
        valid = result.is_valid(),
        "model selected"
    );

    // 3) Residuals for reporting/export.
    let residuals = residual_rows(
        &result,
        &data.temperature,
        &data.usage,
        data.labels.as_deref(),
    );

    Ok(RunOutput {
        source,
        data,
        result,
        residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelShape;

    #[test]
    fn synthetic_run_produces_residual_per_point() {
        let input = InputSource::Synthetic(SyntheticConfig {
            shape: ModelShape::HeatingOnly,
            count: 40,
            noise_sd: 1.0,
            ..SyntheticConfig::default()
        });
        let run = run_fit(&input, &FitOptions::default()).unwrap();

        assert_eq!(run.residuals.len(), 40);
        assert_eq!(run.data.rows_used, 40);
        assert!(run.source.starts_with("synthetic 3P-H"));
        assert!(run.result.is_valid());
        assert!(run.result.heating_changepoint().is_some());
    }

    #[test]
    fn missing_csv_is_an_input_error() {
        let input = InputSource::Csv(IngestConfig {
            csv_path: "/nonexistent/cpm/bills.csv".into(),
            ..IngestConfig::default()
        });
        let err = run_fit(&input, &FitOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_options_are_an_input_error() {
        let input = InputSource::Synthetic(SyntheticConfig::default());
        let options = FitOptions {
            min_r_squared: 1.5,
            ..FitOptions::default()
        };
        let err = run_fit(&input, &options).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
