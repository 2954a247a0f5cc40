//! Validated observation series.

use crate::error::FitError;
use crate::math::{mean, median, sum_sq_dev};

/// Paired (temperature, usage) observations plus summary values the search
/// needs repeatedly.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    temperature: Vec<f64>,
    usage: Vec<f64>,
    t_min: f64,
    t_max: f64,
    t_median: f64,
    usage_mean: f64,
    ss_total: f64,
}

#[allow(clippy::len_without_is_empty)]
impl Observations {
    /// Copy and check the caller's arrays.
    ///
    /// Zero observations is a `NoFeasibleModel`; mismatched lengths or
    /// non-finite values are `InvalidInput`.
    pub fn new(temperature: &[f64], usage: &[f64]) -> Result<Self, FitError> {
        if temperature.len() != usage.len() {
            return Err(FitError::InvalidInput(format!(
                "temperature and usage lengths differ ({} vs {})",
                temperature.len(),
                usage.len()
            )));
        }
        if temperature.is_empty() {
            return Err(FitError::NoFeasibleModel("no observations".to_string()));
        }
        if let Some(i) = temperature.iter().position(|t| !t.is_finite()) {
            return Err(FitError::InvalidInput(format!(
                "temperature[{i}] is not finite"
            )));
        }
        if let Some(i) = usage.iter().position(|u| !u.is_finite()) {
            return Err(FitError::InvalidInput(format!("usage[{i}] is not finite")));
        }

        let t_min = temperature.iter().copied().fold(f64::INFINITY, f64::min);
        let t_max = temperature.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let t_median = median(temperature).unwrap_or(t_min);
        let usage_mean = mean(usage).unwrap_or(0.0);
        let ss_total = sum_sq_dev(usage, usage_mean);

        Ok(Self {
            temperature: temperature.to_vec(),
            usage: usage.to_vec(),
            t_min,
            t_max,
            t_median,
            usage_mean,
            ss_total,
        })
    }

    /// Never zero: `new` rejects an empty series.
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn usage(&self) -> &[f64] {
        &self.usage
    }

    pub fn t_min(&self) -> f64 {
        self.t_min
    }

    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    pub fn t_range(&self) -> f64 {
        self.t_max - self.t_min
    }

    pub fn t_median(&self) -> f64 {
        self.t_median
    }

    pub fn usage_mean(&self) -> f64 {
        self.usage_mean
    }

    /// Total sum of squares of usage around its mean.
    pub fn ss_total(&self) -> f64 {
        self.ss_total
    }

    /// Whether `t` lies strictly inside the observed temperature range.
    pub fn is_interior(&self, t: f64) -> bool {
        t.is_finite() && t > self.t_min && t < self.t_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_values() {
        let obs = Observations::new(&[50.0, 30.0, 40.0, 60.0], &[1.0, 2.0, 3.0, 6.0]).unwrap();
        assert_eq!(obs.len(), 4);
        assert_eq!(obs.t_min(), 30.0);
        assert_eq!(obs.t_max(), 60.0);
        assert_eq!(obs.t_median(), 45.0);
        assert_eq!(obs.usage_mean(), 3.0);
        assert_eq!(obs.ss_total(), 14.0);
        assert!(obs.is_interior(45.0));
        assert!(!obs.is_interior(30.0));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Observations::new(&[], &[]),
            Err(FitError::NoFeasibleModel(_))
        ));
        assert!(matches!(
            Observations::new(&[1.0, 2.0], &[1.0]),
            Err(FitError::InvalidInput(_))
        ));
        assert!(matches!(
            Observations::new(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(FitError::InvalidInput(_))
        ));
    }
}
