//! Local run records
//!
//! Every training run leaves one JSON document under
//! `<runs_dir>/<experiment>/<run_id>.json` with its parameters, validation
//! metrics and, for guarded retraining, the guard decision.

use super::models::MetricsRecord;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunKind {
    /// Unconditional training
    Train,
    /// Retraining behind the quality guard
    Retrain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub experiment: String,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub params: BTreeMap<String, Value>,
    pub metrics: MetricsRecord,
    pub n_train: usize,
    pub n_validation: usize,
    /// `accepted` or `rejected` for guarded runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_decision: Option<String>,
    /// Whether artifacts were written by this run
    pub persisted: bool,
}

/// Write `record` into the experiment directory under `runs_dir`
pub fn write_run_record(runs_dir: impl AsRef<Path>, record: &RunRecord) -> Result<PathBuf> {
    let dir = runs_dir.as_ref().join(&record.experiment);
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{}.json", record.run_id));
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writer.flush()?;

    Ok(path)
}

/// All run records of an experiment, newest first
pub fn read_run_records(runs_dir: impl AsRef<Path>, experiment: &str) -> Result<Vec<RunRecord>> {
    let dir = runs_dir.as_ref().join(experiment);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            let reader = BufReader::new(File::open(&path)?);
            match serde_json::from_reader::<_, RunRecord>(reader) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable run record"),
            }
        }
    }

    records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(records)
}
