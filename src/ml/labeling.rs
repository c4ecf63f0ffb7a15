use crate::config::LabelingConfig;
use crate::error::{AppError, Result};
use crate::models::{FeatureVector, Severity};
use rand::Rng;
use tracing::debug;

/// Ground-truth labeling rule for synthetic incidents.
///
/// An incident above any threshold is `High`. Anything else is `Low` or
/// `Medium` by an independent draw from the caller's random stream.
#[derive(Debug, Clone)]
pub struct SeverityLabeler {
    config: LabelingConfig,
}

impl SeverityLabeler {
    pub fn new(config: LabelingConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.low_probability) {
            return Err(AppError::Configuration(format!(
                "low_probability must be within [0, 1], got {}",
                config.low_probability
            )));
        }
        Ok(Self { config })
    }

    /// Whether the threshold rule alone forces `High`
    pub fn is_high(&self, features: &FeatureVector) -> bool {
        features.num_alerts > self.config.alert_threshold
            || features.attack_duration_sec > self.config.duration_threshold_secs
            || features.num_targets > self.config.target_threshold
    }

    /// Label a single incident. Consumes one draw only when the rule does not apply.
    pub fn label<R: Rng + ?Sized>(&self, features: &FeatureVector, rng: &mut R) -> Severity {
        if self.is_high(features) {
            Severity::High
        } else if rng.gen_bool(self.config.low_probability) {
            Severity::Low
        } else {
            Severity::Medium
        }
    }

    /// Label every incident in order
    pub fn label_all<R: Rng + ?Sized>(
        &self,
        features: &[FeatureVector],
        rng: &mut R,
    ) -> Vec<Severity> {
        let labels: Vec<Severity> = features.iter().map(|f| self.label(f, rng)).collect();

        debug!(
            n_high = labels.iter().filter(|&&s| s == Severity::High).count(),
            n_labels = labels.len(),
            "Assigned ground-truth severity labels"
        );
        labels
    }
}
