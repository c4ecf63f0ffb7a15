use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Severity tier of a synthetic incident.
///
/// The ordinal code doubles as the classifier's class label, so the mapping
/// `0 => Low, 1 => Medium, 2 => High` must never change.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
    EnumString, Display, EnumIter,
)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Ordinal code used for training labels and the exported `severity_score`
    pub fn code(&self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
        }
    }

    /// Inverse of [`Severity::code`]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Severity::Low),
            1 => Some(Severity::Medium),
            2 => Some(Severity::High),
            _ => None,
        }
    }

    /// All tiers in ordinal order
    pub fn all() -> Vec<Severity> {
        Severity::iter().collect()
    }
}

/// Numeric features describing one synthetic incident
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    /// Number of alerts raised
    pub num_alerts: u64,

    /// Attack duration in seconds
    pub attack_duration_sec: f64,

    /// Number of targeted hosts
    pub num_targets: u32,
}

impl FeatureVector {
    pub const N_FEATURES: usize = 3;

    pub fn new(num_alerts: u64, attack_duration_sec: f64, num_targets: u32) -> Self {
        Self {
            num_alerts,
            attack_duration_sec,
            num_targets,
        }
    }

    /// Feature row in model column order
    pub fn as_row(&self) -> [f64; Self::N_FEATURES] {
        [
            self.num_alerts as f64,
            self.attack_duration_sec,
            self.num_targets as f64,
        ]
    }
}

/// Exported incident with its predicted severity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentRecord {
    /// Position of the incident in the generated table
    pub id: usize,

    pub num_alerts: u64,

    pub attack_duration_sec: f64,

    pub num_targets: u32,

    /// Predicted severity name
    pub severity: Severity,

    /// Predicted severity ordinal code
    pub severity_score: u8,
}

impl IncidentRecord {
    /// Build a record from an incident's features and its predicted severity
    pub fn new(id: usize, features: &FeatureVector, predicted: Severity) -> Self {
        Self {
            id,
            num_alerts: features.num_alerts,
            attack_duration_sec: features.attack_duration_sec,
            num_targets: features.num_targets,
            severity: predicted,
            severity_score: predicted.code(),
        }
    }

    /// Check that `severity` and `severity_score` agree
    pub fn is_consistent(&self) -> bool {
        Severity::from_code(self.severity_score) == Some(self.severity)
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector::new(self.num_alerts, self.attack_duration_sec, self.num_targets)
    }
}
