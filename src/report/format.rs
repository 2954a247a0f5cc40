//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{FitResult, ShapeStatus};
use crate::io::ingest::IngestedData;
use crate::report::ResidualRow;

/// Format the full run summary (dataset stats + per-shape diagnostics + chosen model).
pub fn format_run_summary(source: &str, data: &IngestedData, result: &FitResult) -> String {
    let mut out = String::new();

    out.push_str("=== cpm - Change-Point Model Fit ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Columns: temperature=`{}` usage=`{}`\n",
        data.temperature_column, data.usage_column
    ));
    out.push_str(&format!(
        "Points: n={} | temperature=[{:.2}, {:.2}] | usage=[{:.3}, {:.3}]\n",
        data.stats.n_points,
        data.stats.temperature_min,
        data.stats.temperature_max,
        data.stats.usage_min,
        data.stats.usage_max
    ));
    if !data.row_errors.is_empty() {
        out.push_str(&format!(
            "Skipped rows: {} of {}\n",
            data.row_errors.len(),
            data.rows_read
        ));
        for err in data.row_errors.iter().take(5) {
            out.push_str(&format!("  line {}: {}\n", err.line, err.message));
        }
        if data.row_errors.len() > 5 {
            out.push_str(&format!("  ... {} more\n", data.row_errors.len() - 5));
        }
    }

    let thresholds = result.thresholds();
    out.push_str(&format!(
        "\nShape diagnostics (R² >= {:.2}, CV-RMSE <= {:.2}{}):\n",
        thresholds.min_r_squared,
        thresholds.max_cvrmse,
        if thresholds.require_significant_slopes {
            ", significant slopes"
        } else {
            ""
        }
    ));
    for outcome in result.shapes() {
        let chosen = if outcome.shape == result.shape() { "*" } else { " " };
        match &outcome.status {
            ShapeStatus::Fitted {
                r_squared,
                cvrmse,
                breakpoints,
                qualifies,
            } => {
                out.push_str(&format!(
                    "{chosen} {:<11} R²={:.4} CV-RMSE={:.4} breakpoints={} {}\n",
                    outcome.shape.long_label(),
                    r_squared,
                    cvrmse,
                    fmt_vec(breakpoints),
                    if *qualifies { "ok" } else { "below thresholds" }
                ));
            }
            ShapeStatus::Skipped { reason } => {
                out.push_str(&format!(
                    "  (skipped {}) {reason}\n",
                    outcome.shape.long_label()
                ));
            }
        }
    }

    out.push_str("\nChosen model:\n");
    out.push_str(&format!(
        "- {} ({})\n",
        result.long_label(),
        result.selection().describe()
    ));
    out.push_str(&format!("- baseload           : {:.4}\n", result.baseload()));
    if let (Some(slope), Some(cp)) = (result.heating_slope(), result.heating_changepoint()) {
        out.push_str(&format!(
            "- heating            : slope={slope:.4} below {cp:.2} (p={})\n",
            fmt_opt(result.heating_pvalue())
        ));
    }
    if let (Some(slope), Some(cp)) = (result.cooling_slope(), result.cooling_changepoint()) {
        out.push_str(&format!(
            "- cooling            : slope={slope:.4} above {cp:.2} (p={})\n",
            fmt_opt(result.cooling_pvalue())
        ));
    }
    out.push_str(&format!("- R²                 : {}\n", fmt_opt(result.r_squared())));
    out.push_str(&format!("- CV-RMSE            : {}\n", fmt_opt(result.cvrmse())));
    out.push_str(&format!(
        "- valid              : {}\n",
        if result.is_valid() { "yes" } else { "no" }
    ));

    out
}

/// Format the per-observation residual table.
pub fn format_residuals(rows: &[ResidualRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<16} {:>10} {:>12} {:>12} {:>12} {:<8}",
            "label", "temp", "usage", "fitted", "residual", "regime"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<16} {:-<10} {:-<12} {:-<12} {:-<12} {:-<8}",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<16} {:>10.2} {:>12.3} {:>12.3} {:>12.3} {:<8}",
                truncate(&r.label, 16),
                r.temperature,
                r.usage,
                r.fitted,
                r.residual,
                r.regime,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{x:.4}"),
        None => "n/a".to_string(),
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.2}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
