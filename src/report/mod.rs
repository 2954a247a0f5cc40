//! Reporting utilities: residuals and formatted terminal output.

use serde::Serialize;

use crate::domain::FitResult;

mod format;

pub use format::*;

/// One observation with its fitted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualRow {
    pub label: String,
    pub temperature: f64,
    pub usage: f64,
    pub fitted: f64,
    pub residual: f64,
    pub regime: &'static str,
}

/// Pair observations with the model's predictions.
///
/// `labels`, when given, must be parallel to `temperature`; rows are otherwise
/// labelled by their 1-based position.
pub fn residual_rows(
    result: &FitResult,
    temperature: &[f64],
    usage: &[f64],
    labels: Option<&[String]>,
) -> Vec<ResidualRow> {
    temperature
        .iter()
        .zip(usage)
        .enumerate()
        .map(|(i, (&t, &u))| {
            let fitted = result.predict(t);
            ResidualRow {
                label: labels
                    .and_then(|l| l.get(i).cloned())
                    .unwrap_or_else(|| (i + 1).to_string()),
                temperature: t,
                usage: u,
                fitted,
                residual: u - fitted,
                regime: regime_label(result, t),
            }
        })
        .collect()
}

fn regime_label(result: &FitResult, t: f64) -> &'static str {
    if result.heating_changepoint().is_some_and(|cp| t < cp) {
        "heating"
    } else if result.cooling_changepoint().is_some_and(|cp| t > cp) {
        "cooling"
    } else {
        "baseload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitOptions;
    use crate::fit::fit;

    #[test]
    fn residual_rows_label_regimes() {
        let t = vec![30.0, 40.0, 50.0, 60.0, 70.0, 80.0];
        let u = vec![100.0, 90.0, 70.0, 60.0, 65.0, 85.0];
        let opts = FitOptions {
            min_points_per_regime: 2,
            ..FitOptions::default()
        };
        let result = fit(&t, &u, &opts).unwrap();
        let rows = residual_rows(&result, &t, &u, None);

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].label, "1");
        assert_eq!(rows[0].regime, "heating");
        assert_eq!(rows[3].regime, "baseload");
        assert_eq!(rows[5].regime, "cooling");
        for row in &rows {
            assert!((row.usage - row.fitted - row.residual).abs() < 1e-12);
        }
    }

    #[test]
    fn residual_rows_use_labels_when_present() {
        let t = vec![40.0, 50.0];
        let u = vec![10.0, 12.0];
        let result = fit(&t, &u, &FitOptions::default()).unwrap();
        let labels = vec!["jan".to_string(), "feb".to_string()];
        let rows = residual_rows(&result, &t, &u, Some(&labels));

        assert_eq!(rows[0].label, "jan");
        assert_eq!(rows[1].label, "feb");
        assert!(rows.iter().all(|r| r.regime == "baseload"));
        assert!((rows[0].fitted - 11.0).abs() < 1e-12);
    }
}
