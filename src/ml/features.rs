use crate::config::GenerationConfig;
use crate::error::{AppError, Result};
use crate::models::FeatureVector;
use ndarray::Array2;
use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Exp, Poisson};
use tracing::debug;

/// Synthetic incident feature generator.
///
/// Draws are taken column by column: every `num_alerts` value first, then every
/// `attack_duration_sec`, then every `num_targets`. Changing that order changes
/// every downstream value for a given seed.
#[derive(Debug, Clone)]
pub struct FeatureGenerator {
    sample_count: usize,
    alerts: Poisson<f64>,
    durations: Exp<f64>,
    targets: Uniform<u32>,
}

impl FeatureGenerator {
    /// Build a generator from configuration, rejecting unusable distribution parameters
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        if config.sample_count == 0 {
            return Err(AppError::Configuration(
                "sample_count must be positive".to_string(),
            ));
        }
        if config.min_targets == 0 || config.min_targets > config.max_targets {
            return Err(AppError::Configuration(format!(
                "invalid target range [{}, {}]",
                config.min_targets, config.max_targets
            )));
        }

        let alerts = Poisson::new(config.alert_mean).map_err(|e| {
            AppError::Configuration(format!("invalid alert mean {}: {}", config.alert_mean, e))
        })?;

        if config.duration_mean_secs.is_nan() || config.duration_mean_secs <= 0.0 {
            return Err(AppError::Configuration(format!(
                "invalid duration mean {}",
                config.duration_mean_secs
            )));
        }
        let durations = Exp::new(1.0 / config.duration_mean_secs).map_err(|e| {
            AppError::Configuration(format!(
                "invalid duration mean {}: {}",
                config.duration_mean_secs, e
            ))
        })?;

        Ok(Self {
            sample_count: config.sample_count,
            alerts,
            durations,
            targets: Uniform::new_inclusive(config.min_targets, config.max_targets),
        })
    }

    /// Generate `sample_count` feature vectors from the given random stream
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<FeatureVector> {
        let n = self.sample_count;

        let alerts: Vec<u64> = (0..n).map(|_| self.alerts.sample(rng) as u64).collect();
        let durations: Vec<f64> = (0..n).map(|_| self.durations.sample(rng)).collect();
        let targets: Vec<u32> = (0..n).map(|_| self.targets.sample(rng)).collect();

        let features: Vec<FeatureVector> = alerts
            .into_iter()
            .zip(durations)
            .zip(targets)
            .map(|((a, d), t)| FeatureVector::new(a, d, t))
            .collect();

        debug!(n_samples = features.len(), "Generated synthetic incident features");
        features
    }
}

/// Stack feature vectors into an `n_samples × 3` matrix in incident order
pub fn to_matrix(features: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((features.len(), FeatureVector::N_FEATURES));
    for (i, feature) in features.iter().enumerate() {
        for (j, value) in feature.as_row().into_iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }
    matrix
}
