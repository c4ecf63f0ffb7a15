use crate::config::ClassifierConfig;
use crate::error::{AppError, Result};
use crate::ml::features::to_matrix;
use crate::ml::models::{ModelMetadata, ModelType, TrainingDataset};
use crate::models::{FeatureVector, Severity};
use ndarray::Array2;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::SplitCriterion;
use std::collections::HashMap;
use tracing::{debug, info};

type Forest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Trait for fitted severity models
pub trait Classifier {
    /// Predict one severity per feature row, preserving row order
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<Severity>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;
}

/// Random forest severity classifier (unfitted hyperparameters)
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    config: ClassifierConfig,
}

impl SeverityClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    fn parameters(&self) -> RandomForestClassifierParameters {
        let params = RandomForestClassifierParameters::default()
            .with_n_trees(self.config.n_trees)
            .with_criterion(SplitCriterion::Gini)
            .with_min_samples_split(self.config.min_samples_split)
            .with_seed(self.config.seed);

        match self.config.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }

    fn hyperparameters(&self) -> HashMap<String, String> {
        let mut hp = HashMap::new();
        hp.insert("n_trees".to_string(), self.config.n_trees.to_string());
        hp.insert("seed".to_string(), self.config.seed.to_string());
        hp.insert("criterion".to_string(), "gini".to_string());
        hp.insert(
            "min_samples_split".to_string(),
            self.config.min_samples_split.to_string(),
        );
        hp.insert(
            "max_depth".to_string(),
            self.config
                .max_depth
                .map_or_else(|| "none".to_string(), |d| d.to_string()),
        );
        hp
    }

    /// Fit the forest on training features and their ground-truth labels
    pub fn fit(&self, features: &Array2<f64>, labels: &[Severity]) -> Result<TrainedModel> {
        let (n_samples, n_features) = features.dim();
        if n_samples == 0 {
            return Err(AppError::Validation(
                "cannot train on an empty dataset".to_string(),
            ));
        }
        if n_samples != labels.len() {
            return Err(AppError::Validation(format!(
                "feature rows ({}) and labels ({}) differ in length",
                n_samples,
                labels.len()
            )));
        }
        if self.config.n_trees == 0 {
            return Err(AppError::Configuration(
                "n_trees must be positive".to_string(),
            ));
        }

        let estimator = match single_class(labels) {
            // smartcore refuses to fit a forest on one class; every row gets that class.
            Some(only) => {
                debug!(severity = %only, "Training labels hold a single class");
                Estimator::Constant(only)
            }
            None => {
                let x = ndarray_to_densematrix(features);
                let y: Vec<i32> = labels.iter().map(|s| s.code() as i32).collect();
                let forest = Forest::fit(&x, &y, self.parameters()).map_err(|e| {
                    AppError::Model(format!("Failed to train random forest: {}", e))
                })?;
                Estimator::Forest(forest)
            }
        };

        let metadata = ModelMetadata {
            name: "Random Forest".to_string(),
            version: "1.0".to_string(),
            model_type: estimator.model_type(),
            trained_at: chrono::Utc::now(),
            n_training_samples: n_samples,
            n_features,
            hyperparameters: self.hyperparameters(),
        };

        info!(
            n_training_samples = n_samples,
            n_trees = self.config.n_trees,
            model_type = %metadata.model_type,
            "Trained severity classifier"
        );

        Ok(TrainedModel {
            estimator,
            metadata,
        })
    }

    /// Fit on every row of a dataset
    pub fn fit_dataset(&self, dataset: &TrainingDataset) -> Result<TrainedModel> {
        self.fit(&dataset.features, &dataset.severity_labels)
    }
}

fn single_class(labels: &[Severity]) -> Option<Severity> {
    let first = *labels.first()?;
    labels.iter().all(|&s| s == first).then_some(first)
}

enum Estimator {
    Forest(Forest),
    Constant(Severity),
}

impl Estimator {
    fn model_type(&self) -> ModelType {
        match self {
            Estimator::Forest(_) => ModelType::RandomForest,
            Estimator::Constant(_) => ModelType::Constant,
        }
    }
}

/// Fitted severity model. Immutable once trained.
pub struct TrainedModel {
    estimator: Estimator,
    metadata: ModelMetadata,
}

impl TrainedModel {
    /// Predict severities for feature vectors
    pub fn predict_features(&self, features: &[FeatureVector]) -> Result<Vec<Severity>> {
        self.predict(&to_matrix(features))
    }

    /// Predict the severity of a single incident
    pub fn predict_one(&self, features: &FeatureVector) -> Result<Severity> {
        self.predict_features(std::slice::from_ref(features))?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Model("empty prediction".to_string()))
    }
}

impl Classifier for TrainedModel {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<Severity>> {
        let (n_samples, n_features) = features.dim();
        if n_samples == 0 {
            return Ok(Vec::new());
        }
        if n_features != self.metadata.n_features {
            return Err(AppError::Validation(format!(
                "expected {} features per row, got {}",
                self.metadata.n_features, n_features
            )));
        }

        let forest = match &self.estimator {
            Estimator::Constant(severity) => return Ok(vec![*severity; n_samples]),
            Estimator::Forest(forest) => forest,
        };

        let x = ndarray_to_densematrix(features);
        let codes = forest
            .predict(&x)
            .map_err(|e| AppError::Model(format!("Prediction failed: {}", e)))?;

        codes
            .into_iter()
            .map(|code| {
                u8::try_from(code)
                    .ok()
                    .and_then(Severity::from_code)
                    .ok_or_else(|| AppError::Model(format!("unknown severity code {}", code)))
            })
            .collect()
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

fn ndarray_to_densematrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
    let (rows, cols) = arr.dim();
    let data: Vec<f64> = arr.iter().copied().collect();
    DenseMatrix::new(rows, cols, data, false)
}
