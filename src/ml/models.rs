use crate::error::{AppError, Result};
use crate::ml::features::to_matrix;
use crate::models::{FeatureVector, Severity};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Labeled training dataset, rows in incident order
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features)
    pub features: Array2<f64>,

    /// Ground-truth severity labels, one per row
    pub severity_labels: Vec<Severity>,

    /// Number of samples
    pub n_samples: usize,

    /// Number of features
    pub n_features: usize,
}

impl TrainingDataset {
    /// Create a dataset from feature vectors and their ground-truth labels
    pub fn new(features: &[FeatureVector], labels: Vec<Severity>) -> Result<Self> {
        Self::from_matrix(to_matrix(features), labels)
    }

    /// Create a dataset from an existing feature matrix
    pub fn from_matrix(features: Array2<f64>, labels: Vec<Severity>) -> Result<Self> {
        let (n_samples, n_features) = features.dim();
        if n_samples != labels.len() {
            return Err(AppError::Validation(format!(
                "feature rows ({}) and labels ({}) differ in length",
                n_samples,
                labels.len()
            )));
        }

        Ok(Self {
            features,
            severity_labels: labels,
            n_samples,
            n_features,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }

    /// Randomly partition row indices into train and holdout sets.
    ///
    /// The holdout set receives `ceil(n_samples × holdout_fraction)` rows. Both
    /// index lists are returned in ascending order.
    pub fn train_test_split(&self, holdout_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
        if self.is_empty() {
            return Err(AppError::Validation(
                "cannot split an empty dataset".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&holdout_fraction) {
            return Err(AppError::Configuration(format!(
                "holdout fraction must be within [0, 1], got {}",
                holdout_fraction
            )));
        }

        let n_holdout = ((self.n_samples as f64 * holdout_fraction).ceil() as usize)
            .min(self.n_samples);

        let mut permutation: Vec<usize> = (0..self.n_samples).collect();
        permutation.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut holdout_indices = permutation[..n_holdout].to_vec();
        let mut train_indices = permutation[n_holdout..].to_vec();
        holdout_indices.sort_unstable();
        train_indices.sort_unstable();

        Ok(TrainTestSplit {
            train_indices,
            holdout_indices,
        })
    }

    /// Rows at the given indices, in the given order
    pub fn subset(&self, indices: &[usize]) -> Result<TrainingDataset> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_samples) {
            return Err(AppError::Validation(format!(
                "row index {} out of bounds for {} samples",
                bad, self.n_samples
            )));
        }

        let features = self.features.select(Axis(0), indices);
        let labels = indices.iter().map(|&i| self.severity_labels[i]).collect();
        Self::from_matrix(features, labels)
    }
}

/// Disjoint, exhaustive partition of dataset row indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub holdout_indices: Vec<usize>,
}

impl TrainTestSplit {
    /// True when every index in `0..n_samples` appears in exactly one side
    pub fn covers(&self, n_samples: usize) -> bool {
        let mut seen = vec![false; n_samples];
        for &i in self.train_indices.iter().chain(&self.holdout_indices) {
            match seen.get_mut(i) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model version
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Hyperparameters
    pub hyperparameters: HashMap<String, String>,
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Random forest
    RandomForest,

    /// Single-class fallback when training labels hold one tier
    Constant,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::RandomForest => write!(f, "Random Forest"),
            ModelType::Constant => write!(f, "Constant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> TrainingDataset {
        let features: Vec<FeatureVector> = (0..n)
            .map(|i| FeatureVector::new(i as u64, i as f64 * 10.0, 1 + (i % 9) as u32))
            .collect();
        let labels = (0..n)
            .map(|i| Severity::from_code((i % 3) as u8).unwrap())
            .collect();
        TrainingDataset::new(&features, labels).unwrap()
    }

    #[test]
    fn test_dataset_creation() {
        let data = dataset(10);
        assert_eq!(data.n_samples, 10);
        assert_eq!(data.n_features, 3);
        assert_eq!(data.features.shape(), &[10, 3]);
        assert_eq!(
            data.severity_labels[..3],
            [Severity::Low, Severity::Medium, Severity::High]
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let features = vec![FeatureVector::new(1, 1.0, 1); 3];
        let result = TrainingDataset::new(&features, vec![Severity::Low; 2]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_train_test_split_sizes() {
        let data = dataset(100);
        let split = data.train_test_split(0.2, 42).unwrap();

        assert_eq!(split.train_indices.len(), 80);
        assert_eq!(split.holdout_indices.len(), 20);
        assert!(split.covers(100));
    }

    #[test]
    fn test_split_rounds_holdout_up() {
        let split = dataset(5).train_test_split(0.2, 42).unwrap();
        assert_eq!(split.holdout_indices.len(), 1);
        assert_eq!(split.train_indices.len(), 4);

        let split = dataset(7).train_test_split(0.2, 42).unwrap();
        assert_eq!(split.holdout_indices.len(), 2);
    }

    #[test]
    fn test_split_is_reproducible() {
        let data = dataset(50);
        let a = data.train_test_split(0.2, 42).unwrap();
        let b = data.train_test_split(0.2, 42).unwrap();
        let c = data.train_test_split(0.2, 7).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.holdout_indices, c.holdout_indices);
    }

    #[test]
    fn test_split_disjoint_and_exhaustive() {
        let data = dataset(37);
        for seed in 0..20 {
            let split = data.train_test_split(0.3, seed).unwrap();
            assert!(split.covers(37));
            assert!(split
                .train_indices
                .iter()
                .all(|i| !split.holdout_indices.contains(i)));
        }
    }

    #[test]
    fn test_split_extremes() {
        let data = dataset(10);
        let all_train = data.train_test_split(0.0, 1).unwrap();
        assert!(all_train.holdout_indices.is_empty());
        assert_eq!(all_train.train_indices.len(), 10);

        let all_holdout = data.train_test_split(1.0, 1).unwrap();
        assert!(all_holdout.train_indices.is_empty());
    }

    #[test]
    fn test_empty_dataset_split_rejected() {
        let empty = TrainingDataset::new(&[], Vec::new()).unwrap();
        assert!(empty.train_test_split(0.2, 42).is_err());
    }

    #[test]
    fn test_covers_detects_overlap_and_gaps() {
        let overlap = TrainTestSplit {
            train_indices: vec![0, 1],
            holdout_indices: vec![1, 2],
        };
        assert!(!overlap.covers(3));

        let gap = TrainTestSplit {
            train_indices: vec![0],
            holdout_indices: vec![2],
        };
        assert!(!gap.covers(3));
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::RandomForest.to_string(), "Random Forest");
        assert_eq!(ModelType::Constant.to_string(), "Constant");
        assert_eq!(
            serde_json::to_string(&ModelType::RandomForest).unwrap(),
            "\"random_forest\""
        );
    }

    #[test]
    fn test_subset_preserves_rows() {
        let data = dataset(10);
        let subset = data.subset(&[2, 5, 9]).unwrap();

        assert_eq!(subset.n_samples, 3);
        assert_eq!(subset.features[[1, 0]], 5.0);
        assert_eq!(subset.severity_labels[2], data.severity_labels[9]);
        assert!(data.subset(&[10]).is_err());
    }
}
