use crate::config::Config;
use crate::error::Result;
use crate::export::{build_records, IncidentExporter};
use crate::ml::{
    Classifier, FeatureGenerator, ModelMetadata, SeverityClassifier, SeverityLabeler,
    TrainTestSplit, TrainingDataset,
};
use crate::models::{FeatureVector, IncidentRecord, Severity};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything produced by one pass of the pipeline, before export
pub struct PipelineOutput {
    /// Generated features, in incident order
    pub features: Vec<FeatureVector>,

    /// Ground-truth labels used for training
    pub ground_truth: Vec<Severity>,

    /// Train/holdout partition of incident indices
    pub split: TrainTestSplit,

    /// Predicted severity per incident
    pub predictions: Vec<Severity>,

    /// Records ready for export
    pub records: Vec<IncidentRecord>,

    /// Fitted model description
    pub model: ModelMetadata,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub n_incidents: usize,
    pub n_train: usize,
    pub n_holdout: usize,
    pub ground_truth_counts: BTreeMap<Severity, usize>,
    pub predicted_counts: BTreeMap<Severity, usize>,
    pub output_path: PathBuf,
}

/// Generate → Label → Split → Fit → Predict → Export
pub struct IncidentPipeline {
    config: Config,
}

impl IncidentPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run every stage except writing the output file
    pub fn classify(&self) -> Result<PipelineOutput> {
        let generator = FeatureGenerator::new(&self.config.generation)?;
        let labeler = SeverityLabeler::new(self.config.labeling.clone())?;

        // One stream for generation then labeling; the order of draws is part of the output.
        let mut rng = StdRng::seed_from_u64(self.config.generation.seed);
        let features = generator.generate(&mut rng);
        let ground_truth = labeler.label_all(&features, &mut rng);

        info!(
            n_incidents = features.len(),
            seed = self.config.generation.seed,
            "Generated labeled incidents"
        );

        let dataset = TrainingDataset::new(&features, ground_truth.clone())?;
        let split = dataset.train_test_split(
            self.config.split.holdout_fraction,
            self.config.split.seed,
        )?;
        debug!(
            n_train = split.train_indices.len(),
            n_holdout = split.holdout_indices.len(),
            "Partitioned dataset"
        );

        let train = dataset.subset(&split.train_indices)?;
        let model = SeverityClassifier::new(self.config.classifier.clone()).fit_dataset(&train)?;

        // Predictions cover every incident, training rows included.
        let predictions = model.predict(&dataset.features)?;
        let records = build_records(&features, &predictions)?;

        Ok(PipelineOutput {
            features,
            ground_truth,
            split,
            predictions,
            records,
            model: model.metadata().clone(),
        })
    }

    /// Run the full pipeline and write the export file
    pub fn run(&self) -> Result<PipelineReport> {
        let output = self.classify()?;

        let exporter = IncidentExporter::new(self.config.export.output_path.clone());
        exporter.write(&output.records)?;

        let report = PipelineReport {
            n_incidents: output.records.len(),
            n_train: output.split.train_indices.len(),
            n_holdout: output.split.holdout_indices.len(),
            ground_truth_counts: count_by_severity(&output.ground_truth),
            predicted_counts: count_by_severity(&output.predictions),
            output_path: exporter.output_path().to_path_buf(),
        };

        info!(
            n_incidents = report.n_incidents,
            predicted = ?report.predicted_counts,
            "Pipeline completed"
        );
        Ok(report)
    }
}

/// Count severities per tier; every tier appears, possibly with zero
pub fn count_by_severity(labels: &[Severity]) -> BTreeMap<Severity, usize> {
    let mut counts: BTreeMap<Severity, usize> =
        Severity::all().into_iter().map(|s| (s, 0)).collect();
    for label in labels {
        *counts.entry(*label).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(sample_count: usize) -> Config {
        let mut config = Config::default();
        config.generation.sample_count = sample_count;
        config.classifier.n_trees = 10;
        config
    }

    #[test]
    fn test_classify_shapes() {
        let output = IncidentPipeline::new(small_config(40)).classify().unwrap();

        assert_eq!(output.features.len(), 40);
        assert_eq!(output.ground_truth.len(), 40);
        assert_eq!(output.predictions.len(), 40);
        assert_eq!(output.records.len(), 40);
        assert!(output.split.covers(40));
        assert_eq!(output.model.n_training_samples, output.split.train_indices.len());
    }

    #[test]
    fn test_classify_is_deterministic() {
        let pipeline = IncidentPipeline::new(small_config(30));
        let a = pipeline.classify().unwrap();
        let b = pipeline.classify().unwrap();

        assert_eq!(a.records, b.records);
        assert_eq!(a.ground_truth, b.ground_truth);
    }

    #[test]
    fn test_single_class_training_split_completes() {
        for (sample_count, seed) in [(5, 9), (2, 42)] {
            let mut config = small_config(sample_count);
            config.generation.seed = seed;

            let output = IncidentPipeline::new(config).classify().unwrap();
            assert_eq!(output.records.len(), sample_count);
            assert!(output.records.iter().all(|r| r.is_consistent()));
        }
    }

    #[test]
    fn test_run_writes_classified_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(25);
        config.export.output_path = dir.path().join("incidents.json");
        let pipeline = IncidentPipeline::new(config);

        let output = pipeline.classify().unwrap();
        let report = pipeline.run().unwrap();

        let written = crate::export::read_records(&report.output_path).unwrap();
        assert_eq!(written, output.records);
    }

    #[test]
    fn test_zero_samples_fail() {
        let result = IncidentPipeline::new(small_config(0)).classify();
        assert!(result.is_err());
    }

    #[test]
    fn test_count_by_severity() {
        let counts = count_by_severity(&[Severity::High, Severity::High, Severity::Low]);
        assert_eq!(counts[&Severity::Low], 1);
        assert_eq!(counts[&Severity::Medium], 0);
        assert_eq!(counts[&Severity::High], 2);
    }
}
