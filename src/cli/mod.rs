//! Command-line parsing for the change-point model fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_MAX_CVRMSE, DEFAULT_MAX_GRID_POINTS, DEFAULT_MIN_POINTS_PER_REGIME,
    DEFAULT_MIN_R_SQUARED, DEFAULT_REFINE_STEPS, DEFAULT_SIGNIFICANCE_LEVEL,
    DEFAULT_TIE_TOLERANCE, ModelShape, TieBreak,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cpm", version, about = "Change-point energy model fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a change-point model to a temperature/usage CSV.
    Fit(FitArgs),
    /// Generate a synthetic series and fit it.
    Demo(DemoArgs),
}

/// Engine options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Minimum R² for a shape to qualify.
    #[arg(long = "min-r2", env = "CPM_MIN_R2", default_value_t = DEFAULT_MIN_R_SQUARED)]
    pub min_r_squared: f64,

    /// Maximum CV-RMSE for a shape to qualify.
    #[arg(long, env = "CPM_MAX_CVRMSE", default_value_t = DEFAULT_MAX_CVRMSE)]
    pub max_cvrmse: f64,

    /// Minimum observations in each heating/cooling regime (never below 2).
    #[arg(long, default_value_t = DEFAULT_MIN_POINTS_PER_REGIME)]
    pub min_points_per_regime: usize,

    /// Fixed breakpoint grid spacing (degrees). Default: distinct observed temperatures.
    #[arg(long)]
    pub grid_step: Option<f64>,

    /// Shapes to attempt (comma-separated). Default: all.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub shapes: Vec<ModelShape>,

    /// Cap on candidate breakpoints per axis.
    #[arg(long, default_value_t = DEFAULT_MAX_GRID_POINTS)]
    pub max_grid_points: usize,

    /// Subdivisions per side for the local refinement pass (0 disables it).
    #[arg(long, default_value_t = DEFAULT_REFINE_STEPS)]
    pub refine_steps: usize,

    /// Ordering of breakpoint candidates with tied R².
    #[arg(long, value_enum, default_value_t = TieBreak::NearestMedian)]
    pub tie_break: TieBreak,

    /// R² difference treated as a tie.
    #[arg(long, default_value_t = DEFAULT_TIE_TOLERANCE)]
    pub tie_tolerance: f64,

    /// Two-sided p-value below which a slope counts as significant.
    #[arg(long, default_value_t = DEFAULT_SIGNIFICANCE_LEVEL)]
    pub significance_level: f64,

    /// Require significant slopes for a shape to qualify.
    #[arg(long)]
    pub require_significant: bool,
}

/// Output options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Print the per-observation residual table.
    #[arg(long)]
    pub show_residuals: bool,

    /// Export the fit (model + statistics + fitted grid) to JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,

    /// Export per-observation residuals to CSV.
    #[arg(long, value_name = "CSV")]
    pub residuals_csv: Option<PathBuf>,
}

/// Options for fitting a CSV file.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Observation CSV (one row per period).
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Temperature column name. Default: first of temperature/temp/oat/avg_temp/t.
    #[arg(long)]
    pub temperature_column: Option<String>,

    /// Usage column name. Default: first of usage/energy_use/energy/consumption/kwh/y.
    #[arg(long)]
    pub usage_column: Option<String>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for the synthetic demo.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Shape of the generated series.
    #[arg(long, value_enum, default_value_t = ModelShape::HeatingAndCooling)]
    pub shape: ModelShape,

    /// Number of observations to generate.
    #[arg(short = 'n', long, default_value_t = 36)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Lowest generated temperature.
    #[arg(long, default_value_t = 20.0)]
    pub t_min: f64,

    /// Highest generated temperature.
    #[arg(long, default_value_t = 90.0)]
    pub t_max: f64,

    /// Baseload usage.
    #[arg(long, default_value_t = 120.0)]
    pub baseload: f64,

    /// Heating slope (usage per degree, <= 0).
    #[arg(long, default_value_t = -3.0, allow_hyphen_values = true)]
    pub heating_slope: f64,

    /// Heating changepoint temperature.
    #[arg(long, default_value_t = 52.0)]
    pub heating_changepoint: f64,

    /// Cooling changepoint temperature.
    #[arg(long, default_value_t = 68.0)]
    pub cooling_changepoint: f64,

    /// Cooling slope (usage per degree, >= 0).
    #[arg(long, default_value_t = 4.0)]
    pub cooling_slope: f64,

    /// Standard deviation of the usage noise.
    #[arg(long, default_value_t = 6.0)]
    pub noise: f64,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_command_parses_engine_flags() {
        let cli = Cli::try_parse_from([
            "cpm",
            "fit",
            "bills.csv",
            "--min-r2",
            "0.75",
            "--shapes",
            "1p,5p",
            "--tie-break",
            "lowest-temperature",
            "--require-significant",
            "--json",
            "out.json",
        ])
        .unwrap();

        let Command::Fit(args) = cli.command else {
            panic!("expected fit command");
        };
        assert_eq!(args.input, PathBuf::from("bills.csv"));
        assert_eq!(args.model.min_r_squared, 0.75);
        assert_eq!(
            args.model.shapes,
            vec![ModelShape::ConstantOnly, ModelShape::HeatingAndCooling]
        );
        assert_eq!(args.model.tie_break, TieBreak::LowestTemperature);
        assert!(args.model.require_significant);
        assert_eq!(args.output.json, Some(PathBuf::from("out.json")));
        assert_eq!(args.model.refine_steps, DEFAULT_REFINE_STEPS);
    }

    #[test]
    fn demo_command_accepts_negative_slope() {
        let cli = Cli::try_parse_from([
            "cpm",
            "demo",
            "--shape",
            "3p-h",
            "--heating-slope",
            "-1.5",
            "-n",
            "24",
        ])
        .unwrap();

        let Command::Demo(args) = cli.command else {
            panic!("expected demo command");
        };
        assert_eq!(args.shape, ModelShape::HeatingOnly);
        assert_eq!(args.heating_slope, -1.5);
        assert_eq!(args.count, 24);
        assert!(args.model.shapes.is_empty());
    }
}
