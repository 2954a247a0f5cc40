//! Synthetic change-point series.
//!
//! Used by `cpm demo` and by tests that need realistic noisy data. Temperatures
//! are drawn uniformly over a range, usage follows the chosen shape exactly and
//! Gaussian noise is added on top. The RNG is seeded from the full config, so
//! the same config always produces the same series.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::ModelShape;
use crate::error::AppError;
use crate::models::predict;

/// Parameters of a synthetic series.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub shape: ModelShape,
    pub count: usize,
    pub seed: u64,
    pub t_min: f64,
    pub t_max: f64,
    pub baseload: f64,
    /// Usage change per degree below the heating changepoint (≤ 0).
    pub heating_slope: f64,
    pub heating_changepoint: f64,
    pub cooling_changepoint: f64,
    /// Usage change per degree above the cooling changepoint (≥ 0).
    pub cooling_slope: f64,
    /// Standard deviation of the additive usage noise.
    pub noise_sd: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            shape: ModelShape::HeatingAndCooling,
            count: 36,
            seed: 0,
            t_min: 20.0,
            t_max: 90.0,
            baseload: 120.0,
            heating_slope: -3.0,
            heating_changepoint: 52.0,
            cooling_changepoint: 68.0,
            cooling_slope: 4.0,
            noise_sd: 6.0,
        }
    }
}

impl SyntheticConfig {
    /// Coefficient and breakpoint vectors in the layout `models::predict` expects.
    pub fn terms(&self) -> (Vec<f64>, Vec<f64>) {
        match self.shape {
            ModelShape::ConstantOnly => (vec![self.baseload], vec![]),
            ModelShape::HeatingOnly => (
                vec![self.baseload, self.heating_slope],
                vec![self.heating_changepoint],
            ),
            ModelShape::CoolingOnly => (
                vec![self.baseload, self.cooling_slope],
                vec![self.cooling_changepoint],
            ),
            ModelShape::HeatingAndCooling => (
                vec![self.baseload, self.heating_slope, self.cooling_slope],
                vec![self.heating_changepoint, self.cooling_changepoint],
            ),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.count == 0 {
            return Err(AppError::new(2, "Sample count must be > 0."));
        }
        if !(self.t_min.is_finite() && self.t_max.is_finite() && self.t_max > self.t_min) {
            return Err(AppError::new(2, "Invalid temperature range for sample generation."));
        }
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(AppError::new(2, "Noise standard deviation must be finite and >= 0."));
        }
        if self.heating_slope > 0.0 || self.cooling_slope < 0.0 {
            return Err(AppError::new(
                2,
                "Heating slope must be <= 0 and cooling slope >= 0.",
            ));
        }
        if self.shape == ModelShape::HeatingAndCooling
            && self.heating_changepoint >= self.cooling_changepoint
        {
            return Err(AppError::new(
                2,
                "Heating changepoint must be below the cooling changepoint.",
            ));
        }
        let params = [
            self.baseload,
            self.heating_slope,
            self.heating_changepoint,
            self.cooling_changepoint,
            self.cooling_slope,
        ];
        if params.iter().any(|v| !v.is_finite()) {
            return Err(AppError::new(2, "Synthetic model parameters must be finite."));
        }
        Ok(())
    }
}

/// A generated series, sorted by temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    pub temperature: Vec<f64>,
    pub usage: Vec<f64>,
}

pub fn generate_series(config: &SyntheticConfig) -> Result<SyntheticSeries, AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(series_seed(config));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut temperature: Vec<f64> = (0..config.count)
        .map(|_| rng.gen_range(config.t_min..=config.t_max))
        .collect();
    temperature.sort_by(f64::total_cmp);

    let (coefficients, breakpoints) = config.terms();
    let usage = temperature
        .iter()
        .map(|&t| {
            let z: f64 = normal.sample(&mut rng);
            predict(config.shape, t, &coefficients, &breakpoints) + config.noise_sd * z
        })
        .collect();

    Ok(SyntheticSeries { temperature, usage })
}

fn series_seed(config: &SyntheticConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.shape.hash(&mut hasher);
    config.count.hash(&mut hasher);
    config.seed.hash(&mut hasher);
    config.t_min.to_bits().hash(&mut hasher);
    config.t_max.to_bits().hash(&mut hasher);
    config.baseload.to_bits().hash(&mut hasher);
    config.heating_slope.to_bits().hash(&mut hasher);
    config.heating_changepoint.to_bits().hash(&mut hasher);
    config.cooling_changepoint.to_bits().hash(&mut hasher);
    config.cooling_slope.to_bits().hash(&mut hasher);
    config.noise_sd.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitOptions;
    use crate::fit::fit;

    #[test]
    fn same_config_same_series() {
        let config = SyntheticConfig::default();
        let a = generate_series(&config).unwrap();
        let b = generate_series(&config).unwrap();
        assert_eq!(a, b);

        let other = generate_series(&SyntheticConfig {
            seed: 7,
            ..config
        })
        .unwrap();
        assert_ne!(a.usage, other.usage);
    }

    #[test]
    fn series_respects_range_and_order() {
        let config = SyntheticConfig {
            count: 200,
            ..SyntheticConfig::default()
        };
        let series = generate_series(&config).unwrap();
        assert_eq!(series.temperature.len(), 200);
        assert!(series.temperature.windows(2).all(|w| w[0] <= w[1]));
        assert!(series
            .temperature
            .iter()
            .all(|&t| (config.t_min..=config.t_max).contains(&t)));
    }

    #[test]
    fn noiseless_series_follows_the_model() {
        let config = SyntheticConfig {
            shape: ModelShape::CoolingOnly,
            noise_sd: 0.0,
            ..SyntheticConfig::default()
        };
        let series = generate_series(&config).unwrap();
        for (&t, &u) in series.temperature.iter().zip(&series.usage) {
            let expected = 120.0 + 4.0 * (t - 68.0).max(0.0);
            assert!((u - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_invalid_configs() {
        let zero = SyntheticConfig {
            count: 0,
            ..SyntheticConfig::default()
        };
        assert_eq!(generate_series(&zero).unwrap_err().exit_code(), 2);

        let wrong_sign = SyntheticConfig {
            heating_slope: 2.0,
            ..SyntheticConfig::default()
        };
        assert!(generate_series(&wrong_sign).is_err());
    }

    #[test]
    fn fitted_model_recovers_generated_changepoints() {
        let config = SyntheticConfig {
            count: 120,
            noise_sd: 2.0,
            ..SyntheticConfig::default()
        };
        let series = generate_series(&config).unwrap();
        let result = fit(&series.temperature, &series.usage, &FitOptions::default()).unwrap();

        assert_eq!(result.shape(), ModelShape::HeatingAndCooling);
        assert!(result.is_valid());
        assert!((result.heating_changepoint().unwrap() - 52.0).abs() < 3.0);
        assert!((result.cooling_changepoint().unwrap() - 68.0).abs() < 3.0);
    }
}
