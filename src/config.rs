use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_ENV: &str = "CYBER_INCIDENTS_CONFIG";

/// Prefix for environment overrides, e.g. `CYBER_INCIDENTS__GENERATION__SAMPLE_COUNT=500`
pub const ENV_PREFIX: &str = "CYBER_INCIDENTS";

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct Config {
    /// Synthetic feature generation
    #[serde(default)]
    #[validate(nested)]
    pub generation: GenerationConfig,

    /// Ground-truth labeling rule
    #[serde(default)]
    #[validate(nested)]
    pub labeling: LabelingConfig,

    /// Train/holdout partitioning
    #[serde(default)]
    #[validate(nested)]
    pub split: SplitConfig,

    /// Random forest settings
    #[serde(default)]
    #[validate(nested)]
    pub classifier: ClassifierConfig,

    /// Export destination
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and the environment.
    ///
    /// When `path` is `None`, the file named by `CYBER_INCIDENTS_CONFIG` is used if set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ));

        if let Some(file) = explicit.as_deref() {
            builder = builder.add_source(config::File::from(file).required(true));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string layered over the embedded defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_target_range"))]
pub struct GenerationConfig {
    /// Number of incidents to synthesize
    #[serde(default = "default_sample_count")]
    #[validate(range(min = 1))]
    pub sample_count: usize,

    /// Seed for the shared generation/labeling random stream
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Poisson mean of `num_alerts`
    #[serde(default = "default_alert_mean")]
    #[validate(range(min = 0.000001))]
    pub alert_mean: f64,

    /// Exponential mean of `attack_duration_sec`
    #[serde(default = "default_duration_mean_secs")]
    #[validate(range(min = 0.000001))]
    pub duration_mean_secs: f64,

    /// Smallest `num_targets` value (inclusive)
    #[serde(default = "default_min_targets")]
    #[validate(range(min = 1))]
    pub min_targets: u32,

    /// Largest `num_targets` value (inclusive)
    #[serde(default = "default_max_targets")]
    pub max_targets: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            seed: default_seed(),
            alert_mean: default_alert_mean(),
            duration_mean_secs: default_duration_mean_secs(),
            min_targets: default_min_targets(),
            max_targets: default_max_targets(),
        }
    }
}

fn validate_target_range(config: &GenerationConfig) -> std::result::Result<(), ValidationError> {
    if config.min_targets > config.max_targets {
        return Err(ValidationError::new("min_targets_exceeds_max_targets"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LabelingConfig {
    /// Incidents with more alerts than this are High
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u64,

    /// Incidents lasting longer than this are High
    #[serde(default = "default_duration_threshold_secs")]
    #[validate(range(min = 0.0))]
    pub duration_threshold_secs: f64,

    /// Incidents hitting more targets than this are High
    #[serde(default = "default_target_threshold")]
    pub target_threshold: u32,

    /// Probability of Low (otherwise Medium) for incidents below every threshold
    #[serde(default = "default_low_probability")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub low_probability: f64,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            alert_threshold: default_alert_threshold(),
            duration_threshold_secs: default_duration_threshold_secs(),
            target_threshold: default_target_threshold(),
            low_probability: default_low_probability(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SplitConfig {
    /// Fraction of incidents withheld from training
    #[serde(default = "default_holdout_fraction")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub holdout_fraction: f64,

    /// Shuffle seed for the partition
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: default_holdout_fraction(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassifierConfig {
    /// Number of trees in the forest
    #[serde(default = "default_n_trees")]
    #[validate(range(min = 1))]
    pub n_trees: u16,

    /// Bootstrap/feature-sampling seed
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum tree depth (unbounded when absent)
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_depth: Option<u16>,

    /// Minimum samples required to split a node
    #[serde(default = "default_min_samples_split")]
    #[validate(range(min = 2))]
    pub min_samples_split: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            seed: default_seed(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Destination of the incident JSON file
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_sample_count() -> usize {
    100
}

fn default_seed() -> u64 {
    42
}

fn default_alert_mean() -> f64 {
    5.0
}

fn default_duration_mean_secs() -> f64 {
    300.0
}

fn default_min_targets() -> u32 {
    1
}

fn default_max_targets() -> u32 {
    9
}

fn default_alert_threshold() -> u64 {
    7
}

fn default_duration_threshold_secs() -> f64 {
    400.0
}

fn default_target_threshold() -> u32 {
    7
}

fn default_low_probability() -> f64 {
    0.6
}

fn default_holdout_fraction() -> f64 {
    0.2
}

fn default_n_trees() -> u16 {
    50
}

fn default_min_samples_split() -> usize {
    2
}

fn default_output_path() -> PathBuf {
    PathBuf::from("incidents.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.generation.sample_count, 100);
        assert_eq!(config.generation.seed, 42);
        assert_eq!(config.classifier.n_trees, 50);
        assert_eq!(config.split.holdout_fraction, 0.2);
        assert_eq!(config.export.output_path, PathBuf::from("incidents.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_embedded_defaults_match_constants() {
        let config = Config::from_toml_str("").unwrap();
        let defaults = Config::default();

        assert_eq!(config.generation.sample_count, defaults.generation.sample_count);
        assert_eq!(config.generation.alert_mean, defaults.generation.alert_mean);
        assert_eq!(
            config.generation.duration_mean_secs,
            defaults.generation.duration_mean_secs
        );
        assert_eq!(config.labeling.low_probability, defaults.labeling.low_probability);
        assert_eq!(config.split.seed, defaults.split.seed);
        assert_eq!(config.classifier.max_depth, None);
    }

    #[test]
    fn test_override_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [generation]
            sample_count = 5

            [export]
            output_path = "out/small.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.generation.sample_count, 5);
        assert_eq!(config.generation.seed, 42);
        assert_eq!(config.export.output_path, PathBuf::from("out/small.json"));
    }

    #[test]
    fn test_zero_sample_count_rejected() {
        let result = Config::from_toml_str("[generation]\nsample_count = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_target_range_rejected() {
        let mut config = Config::default();
        config.generation.min_targets = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_holdout_fraction_out_of_range_rejected() {
        let mut config = Config::default();
        config.split.holdout_fraction = 1.5;
        assert!(config.validate().is_err());
    }
}
