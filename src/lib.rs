//! Synthetic cyber incident generation and severity classification.
//!
//! The pipeline generates incident features from seeded distributions, labels
//! them with a threshold rule, fits a random forest on a training partition,
//! predicts every incident's severity and exports the result as JSON.

pub mod config;
pub mod error;
pub mod export;
pub mod ml;
pub mod models;
pub mod pipeline;

pub use config::Config;
pub use error::{AppError, Result};
pub use pipeline::{IncidentPipeline, PipelineOutput, PipelineReport};
