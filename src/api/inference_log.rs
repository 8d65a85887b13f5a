//! Append-only inference log written by the prediction endpoint
//!
//! Each line is a structured-log envelope whose `record.message` holds the
//! prediction event as a serialized mapping, the format read back by
//! [`crate::monitoring::log_reader`].

use crate::error::Result;
use crate::monitoring::PREDICTION_EVENT;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One served prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionEvent {
    pub event: &'static str,
    pub features: Map<String, Value>,
    pub probability: f64,
    pub prediction: bool,
}

impl PredictionEvent {
    pub fn new(features: Map<String, Value>, probability: f64, prediction: bool) -> Self {
        Self {
            event: PREDICTION_EVENT,
            features,
            probability,
            prediction,
        }
    }
}

/// Serialises appends to the inference log file
#[derive(Debug)]
pub struct InferenceLogWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl InferenceLogWriter {
    /// Open `path` for appending, creating it and its parent directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &PredictionEvent) -> Result<()> {
        self.append_at(event, Utc::now())
    }

    pub fn append_at(&self, event: &PredictionEvent, at: DateTime<Utc>) -> Result<()> {
        let mut line = serde_json::to_string(&envelope(event, at)?)?;
        line.push('\n');

        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

fn envelope(event: &PredictionEvent, at: DateTime<Utc>) -> Result<Value> {
    let message = serde_json::to_string(event)?;
    Ok(json!({
        "text": format!("{}\n", message),
        "record": {
            "message": message,
            "level": { "name": "INFO" },
            "time": {
                "repr": at.to_rfc3339(),
                "timestamp": at.timestamp_millis() as f64 / 1000.0,
            },
        },
    }))
}
