//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads a CSV or generates a synthetic series
//! - runs model fitting + selection
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DemoArgs, FitArgs, ModelArgs, OutputArgs};
use crate::data::SyntheticConfig;
use crate::domain::{FitOptions, ModelShape};
use crate::error::AppError;
use crate::io::ingest::IngestConfig;

pub mod pipeline;

use pipeline::{InputSource, RunOutput};

/// Entry point for the `cpm` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let input = InputSource::Csv(IngestConfig {
        csv_path: args.input.clone(),
        temperature_column: args.temperature_column.clone(),
        usage_column: args.usage_column.clone(),
    });
    let options = fit_options_from_args(&args.model);
    let run = pipeline::run_fit(&input, &options)?;
    present(&run, &args.output)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let input = InputSource::Synthetic(synthetic_config_from_args(&args));
    let options = fit_options_from_args(&args.model);
    let run = pipeline::run_fit(&input, &options)?;
    present(&run, &args.output)
}

fn present(run: &RunOutput, output: &OutputArgs) -> Result<(), AppError> {
    println!(
        "{}",
        crate::report::format_run_summary(&run.source, &run.data, &run.result)
    );
    if output.show_residuals {
        println!("{}", crate::report::format_residuals(&run.residuals));
    }

    // Optional exports.
    if let Some(path) = &output.json {
        crate::io::export::write_fit_json(
            path,
            &run.result,
            Some(run.source.clone()),
            run.data.stats.temperature_min,
            run.data.stats.temperature_max,
        )?;
    }
    if let Some(path) = &output.residuals_csv {
        crate::io::export::write_residuals_csv(path, &run.residuals)?;
    }

    Ok(())
}

pub fn fit_options_from_args(args: &ModelArgs) -> FitOptions {
    FitOptions {
        min_r_squared: args.min_r_squared,
        max_cvrmse: args.max_cvrmse,
        min_points_per_regime: args.min_points_per_regime,
        breakpoint_grid_step: args.grid_step,
        shapes_to_try: if args.shapes.is_empty() {
            ModelShape::ALL.to_vec()
        } else {
            args.shapes.clone()
        },
        max_grid_points: args.max_grid_points,
        refine_steps: args.refine_steps,
        tie_break: args.tie_break,
        tie_tolerance: args.tie_tolerance,
        significance_level: args.significance_level,
        require_significant_slopes: args.require_significant,
    }
}

pub fn synthetic_config_from_args(args: &DemoArgs) -> SyntheticConfig {
    SyntheticConfig {
        shape: args.shape,
        count: args.count,
        seed: args.seed,
        t_min: args.t_min,
        t_max: args.t_max,
        baseload: args.baseload,
        heating_slope: args.heating_slope,
        heating_changepoint: args.heating_changepoint,
        cooling_changepoint: args.cooling_changepoint,
        cooling_slope: args.cooling_slope,
        noise_sd: args.noise,
    }
}
