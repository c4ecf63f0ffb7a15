//! Incident export
//!
//! Joins the generated feature table with predicted severities and writes the
//! resulting records as an indented JSON array.

use crate::error::{AppError, Result};
use crate::models::{FeatureVector, IncidentRecord, Severity};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes classified incidents to a JSON file
#[derive(Debug, Clone)]
pub struct IncidentExporter {
    output_path: PathBuf,
}

impl IncidentExporter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write already-built records to the output path
    pub fn write(&self, records: &[IncidentRecord]) -> Result<()> {
        write_records(records, &self.output_path)?;

        info!(
            n_records = records.len(),
            path = %self.output_path.display(),
            "Exported classified incidents"
        );
        Ok(())
    }
}

/// Pair each feature vector with its prediction; `id` is the row index
pub fn build_records(
    features: &[FeatureVector],
    predictions: &[Severity],
) -> Result<Vec<IncidentRecord>> {
    if features.len() != predictions.len() {
        return Err(AppError::Validation(format!(
            "feature rows ({}) and predictions ({}) differ in length",
            features.len(),
            predictions.len()
        )));
    }

    Ok(features
        .iter()
        .zip(predictions)
        .enumerate()
        .map(|(id, (f, &severity))| IncidentRecord::new(id, f, severity))
        .collect())
}

/// Serialize records exactly as [`write_records`] would write them
pub fn to_json_string(records: &[IncidentRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Write records to `path`. The parent directory must already exist.
pub fn write_records(records: &[IncidentRecord], path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Read records back from an exported file
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<IncidentRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
