/// Machine learning module for synthetic incident severity classification
///
/// This module provides:
/// - Synthetic feature generation from seeded distributions
/// - Ground-truth severity labeling
/// - Train/holdout partitioning
/// - Random forest fitting and batch prediction

pub mod classifier;
pub mod features;
pub mod labeling;
pub mod models;

pub use classifier::{Classifier, SeverityClassifier, TrainedModel};
pub use features::{to_matrix, FeatureGenerator};
pub use labeling::SeverityLabeler;
pub use models::{ModelMetadata, ModelType, TrainTestSplit, TrainingDataset};
