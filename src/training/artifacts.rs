use super::classifier::ChurnModel;
use super::models::{BaselineStats, MetricsRecord, TrainSchema};
use crate::config::PathsConfig;
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub model: ChurnModel,
    pub metrics: MetricsRecord,
    pub schema: TrainSchema,
    pub baseline: BaselineStats,
}

/// Deployed model artifacts on disk
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_path: PathBuf,
    metrics_path: PathBuf,
    schema_path: PathBuf,
    baseline_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            model_path: paths.model_path(),
            metrics_path: paths.metrics_path(),
            schema_path: paths.schema_path(),
            baseline_path: paths.baseline_stats_path(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn metrics_path(&self) -> &Path {
        &self.metrics_path
    }

    /// Metrics of the deployed model; `None` when nothing has been deployed yet
    pub fn load_metrics(&self) -> Result<Option<MetricsRecord>> {
        if !self.metrics_path.exists() {
            return Ok(None);
        }
        read_json(&self.metrics_path).map(Some)
    }

    pub fn load_model(&self) -> Result<ChurnModel> {
        if !self.model_path.exists() {
            return Err(AppError::ModelUnavailable(format!(
                "no model at {}",
                self.model_path.display()
            )));
        }
        read_json(&self.model_path)
    }

    pub fn load_schema(&self) -> Result<TrainSchema> {
        if !self.schema_path.exists() {
            return Err(AppError::ModelUnavailable(format!(
                "no schema at {}",
                self.schema_path.display()
            )));
        }
        read_json(&self.schema_path)
    }

    /// Replace the deployed artifacts; metrics are written last
    pub fn save(&self, artifacts: &TrainedArtifacts) -> Result<()> {
        write_json(&self.model_path, &artifacts.model)?;
        write_json(&self.schema_path, &artifacts.schema)?;
        write_json(&self.baseline_path, &artifacts.baseline)?;
        write_json(&self.metrics_path, &artifacts.metrics)?;

        info!(
            model = %self.model_path.display(),
            roc_auc = artifacts.metrics.roc_auc,
            accuracy = artifacts.metrics.accuracy,
            "Model artifacts saved"
        );
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| {
        AppError::Serialization(format!("{}: {}", path.display(), e))
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
