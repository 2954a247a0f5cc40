//! CSV ingest and validation.
//!
//! Turns a utility-bill style CSV (one row per billing period) into paired
//! `(temperature, usage)` series that are safe to hand to the engine.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::error::AppError;

/// Header names tried (in order) when no temperature column is given.
pub const TEMPERATURE_ALIASES: [&str; 5] = ["temperature", "temp", "oat", "avg_temp", "t"];
/// Header names tried (in order) when no usage column is given.
pub const USAGE_ALIASES: [&str; 6] = ["usage", "energy_use", "energy", "consumption", "kwh", "y"];
/// Optional per-row label (billing period, date, ...), carried into reports.
pub const LABEL_ALIASES: [&str; 4] = ["period", "date", "month", "label"];

/// Where to read observations from.
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    pub csv_path: PathBuf,
    /// Explicit temperature column (case-insensitive); aliases otherwise.
    pub temperature_column: Option<String>,
    /// Explicit usage column (case-insensitive); aliases otherwise.
    pub usage_column: Option<String>,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Summary stats about the rows actually used for fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_points: usize,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub usage_min: f64,
    pub usage_max: f64,
}

/// Ingest output: parallel series + optional labels + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub temperature: Vec<f64>,
    pub usage: Vec<f64>,
    /// One entry per used row when the CSV has a label column.
    pub labels: Option<Vec<String>>,
    pub temperature_column: String,
    pub usage_column: String,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedData {
    /// Wrap an in-memory series (e.g. a synthetic one) so it flows through the
    /// same reporting and export path as CSV input.
    pub fn from_series(temperature: Vec<f64>, usage: Vec<f64>) -> Result<Self, AppError> {
        if temperature.len() != usage.len() {
            return Err(AppError::new(
                4,
                "Temperature and usage series have different lengths.",
            ));
        }
        let stats = compute_stats(&temperature, &usage)
            .ok_or_else(|| AppError::new(3, "Series is empty."))?;
        let n = temperature.len();
        Ok(Self {
            temperature,
            usage,
            labels: None,
            temperature_column: "temperature".to_string(),
            usage_column: "usage".to_string(),
            stats,
            row_errors: Vec::new(),
            rows_read: n,
            rows_used: n,
        })
    }
}

/// Load observations from `config.csv_path`.
pub fn load_observations(config: &IngestConfig) -> Result<IngestedData, AppError> {
    let file = File::open(&config.csv_path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open CSV '{}': {e}", config.csv_path.display()),
        )
    })?;
    read_observations(
        file,
        config.temperature_column.as_deref(),
        config.usage_column.as_deref(),
    )
}

/// Parse observations from any CSV source.
pub fn read_observations<R: Read>(
    source: R,
    temperature_column: Option<&str>,
    usage_column: Option<&str>,
) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let (temperature_column, t_idx) =
        resolve_column(&header_map, temperature_column, &TEMPERATURE_ALIASES, "temperature")?;
    let (usage_column, u_idx) = resolve_column(&header_map, usage_column, &USAGE_ALIASES, "usage")?;
    let label_idx = LABEL_ALIASES
        .iter()
        .find_map(|name| header_map.get(*name).copied());

    let mut temperature = Vec::new();
    let mut usage = Vec::new();
    let mut labels = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = parse_value(&record, t_idx, &temperature_column)
            .and_then(|t| parse_value(&record, u_idx, &usage_column).map(|u| (t, u)));
        match parsed {
            Ok((t, u)) => {
                temperature.push(t);
                usage.push(u);
                if let Some(i) = label_idx {
                    labels.push(record.get(i).unwrap_or("").to_string());
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = temperature.len();
    let stats = compute_stats(&temperature, &usage)
        .ok_or_else(|| AppError::new(3, "No valid rows remain after validation."))?;

    Ok(IngestedData {
        temperature,
        usage,
        labels: label_idx.map(|_| labels),
        temperature_column,
        usage_column,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_column(
    header_map: &HashMap<String, usize>,
    explicit: Option<&str>,
    aliases: &[&str],
    role: &str,
) -> Result<(String, usize), AppError> {
    if let Some(name) = explicit {
        let key = normalize_header_name(name);
        return header_map
            .get(&key)
            .map(|&idx| (key.clone(), idx))
            .ok_or_else(|| AppError::new(2, format!("Missing {role} column: `{name}`")));
    }

    aliases
        .iter()
        .find_map(|alias| header_map.get(*alias).map(|&idx| (alias.to_string(), idx)))
        .ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "Missing {role} column: expected one of {}",
                    aliases
                        .iter()
                        .map(|a| format!("`{a}`"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })
}

fn parse_value(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{name}` value."))?;
    let value = raw
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{raw}'."))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}

fn compute_stats(temperature: &[f64], usage: &[f64]) -> Option<DatasetStats> {
    if temperature.is_empty() {
        return None;
    }
    let fold_min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);
    let fold_max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(DatasetStats {
        n_points: temperature.len(),
        temperature_min: fold_min(temperature),
        temperature_max: fold_max(temperature),
        usage_min: fold_min(usage),
        usage_max: fold_max(usage),
    })
}

/// Display helper for log lines and reports.
pub fn describe_source(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
