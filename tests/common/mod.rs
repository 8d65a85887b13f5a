//! Common test utilities
//!
//! Builds an isolated workspace (dataset, artifacts, logs) under a temporary
//! directory with a synthetic churn dataset shaped like the bigml export.

#![allow(dead_code)]

use churn_sentinel::api::{InferenceLogWriter, PredictionEvent};
use churn_sentinel::config::{Config, PathsConfig};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;

pub const STATES: [&str; 4] = ["CA", "NY", "TX", "OH"];
pub const AREA_CODES: [u32; 3] = [408, 415, 510];

/// Temporary workspace with a configuration rooted inside it
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.paths = PathsConfig::rooted_at(dir.path());
        Self { dir, config }
    }

    /// Workspace with `rows` rows of training data written to the data path
    pub fn with_dataset(rows: usize) -> Self {
        let ws = Self::new();
        ws.write_dataset(rows);
        ws
    }

    pub fn write_dataset(&self, rows: usize) {
        let path = &self.config.paths.data_path;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, churn_csv(rows)).unwrap();
    }

    /// Append prediction events for the given feature rows through the API log writer
    pub fn log_predictions(&self, rows: impl IntoIterator<Item = Map<String, Value>>) {
        let writer = InferenceLogWriter::open(&self.config.paths.inference_log).unwrap();
        for features in rows {
            writer
                .append(&PredictionEvent::new(features, 0.25, false))
                .unwrap();
        }
    }
}

/// Deterministic feature mapping of customer `i` (without the target)
pub fn customer(i: usize) -> Map<String, Value> {
    let churn = is_churner(i);
    let value = json!({
        "State": STATES[i % STATES.len()],
        "Account length": 60 + (i * 7) % 120,
        "Area code": AREA_CODES[i % AREA_CODES.len()],
        "International plan": if churn && i % 3 != 0 { "Yes" } else if i % 11 == 0 { "Yes" } else { "No" },
        "Voice mail plan": if i % 4 == 1 { "Yes" } else { "No" },
        "Number vmail messages": if i % 4 == 1 { 10 + i % 30 } else { 0 },
        "Total day minutes": 120.0 + ((i * 13) % 90) as f64 + if churn { 60.0 } else { 0.0 },
        "Total day calls": 80 + (i * 3) % 40,
        "Customer service calls": if churn { 3 + i % 4 } else { i % 3 },
    });
    value.as_object().cloned().unwrap()
}

/// Customer whose distribution is shifted away from the training data
pub fn shifted_customer(i: usize) -> Map<String, Value> {
    let mut row = customer(i);
    row.insert("State".to_string(), json!("ZZ"));
    row.insert("Total day minutes".to_string(), json!(400.0 + i as f64));
    row.insert("Total day calls".to_string(), json!(200 + i));
    row.insert("Customer service calls".to_string(), json!(9));
    row.insert("Account length".to_string(), json!(500 + i));
    row
}

pub fn is_churner(i: usize) -> bool {
    i % 5 == 0
}

pub const COLUMNS: [&str; 10] = [
    "State",
    "Account length",
    "Area code",
    "International plan",
    "Voice mail plan",
    "Number vmail messages",
    "Total day minutes",
    "Total day calls",
    "Customer service calls",
    "Churn",
];

/// CSV text of `rows` customers with a `True`/`False` churn column
pub fn churn_csv(rows: usize) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');
    for i in 0..rows {
        let row = customer(i);
        let cells: Vec<String> = COLUMNS
            .iter()
            .map(|c| match *c {
                "Churn" => if is_churner(i) { "True" } else { "False" }.to_string(),
                name => match &row[name] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Parse Prometheus exposition format into metric name -> lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                current_metric = parts[2].to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}
