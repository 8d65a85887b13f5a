//! Training pipeline: dataset preparation, stratified split, fit and validation

use super::artifacts::{ArtifactStore, TrainedArtifacts};
use super::classifier::{ChurnModel, LogisticModel};
use super::evaluation::{accuracy, roc_auc};
use super::features::{mean_and_std, numeric_cell, Preprocessor};
use super::models::{BaselineStats, ColumnStats, MetricsRecord, TrainSchema};
use super::tracking::{write_run_record, RunKind, RunRecord};
use crate::config::{Config, TrainingConfig};
use crate::data::{load_csv, Table};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Feature table, binary labels and the derived schema
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub features: Table,
    pub labels: Vec<bool>,
    pub schema: TrainSchema,
}

/// In-memory result of fitting a candidate model
#[derive(Debug, Clone)]
pub struct FittedCandidate {
    pub artifacts: TrainedArtifacts,
    pub n_train: usize,
    pub n_validation: usize,
}

/// Result of an unconditional training run
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub metrics: MetricsRecord,
    pub run_record: PathBuf,
}

/// Map a target cell to churn / no churn
pub fn parse_target(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "Yes" | "yes" | "True" | "true" | "1" => Some(true),
            "No" | "no" | "False" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Split a labelled table into features and labels and classify its columns
pub fn prepare_training_data(table: &Table, config: &TrainingConfig) -> Result<PreparedData> {
    let target = config.target_column.as_str();
    if !table.has_column(target) {
        return Err(AppError::Validation(format!(
            "target column '{}' not found in dataset",
            target
        )));
    }

    let labels = (0..table.len())
        .map(|i| {
            table.get(i, target).and_then(parse_target).ok_or_else(|| {
                AppError::Validation(format!(
                    "row {}: unrecognised value {:?} for target '{}'",
                    i + 1,
                    table.get(i, target),
                    target
                ))
            })
        })
        .collect::<Result<Vec<bool>>>()?;

    let features = table.drop_column(target);
    let mut categorical = Vec::new();
    let mut numerical = Vec::new();
    for column in features.columns() {
        let configured = config.categorical_features.iter().any(|c| c == column);
        let non_numeric = features
            .non_null(column)
            .iter()
            .any(|v| !matches!(v, Value::Number(_) | Value::Bool(_)));
        if configured || non_numeric {
            categorical.push(column.clone());
        } else {
            numerical.push(column.clone());
        }
    }

    let schema = TrainSchema {
        categorical_features: categorical,
        numerical_features: numerical,
        all_features: features.columns().to_vec(),
        target: target.to_string(),
    };

    Ok(PreparedData {
        features,
        labels,
        schema,
    })
}

/// Deterministic stratified split into `(train, validation)` row indices
///
/// Within each class the k-th sample goes to validation whenever
/// `floor((k + 1) * test_size)` advances, spreading validation rows evenly.
pub fn stratified_split(labels: &[bool], test_size: f64) -> (Vec<usize>, Vec<usize>) {
    let mut train = Vec::new();
    let mut validation = Vec::new();

    for class in [false, true] {
        let members = labels
            .iter()
            .enumerate()
            .filter(|&(_, &y)| y == class)
            .map(|(i, _)| i);
        for (k, index) in members.enumerate() {
            let before = (k as f64 * test_size).floor();
            let after = ((k + 1) as f64 * test_size).floor();
            if after > before {
                validation.push(index);
            } else {
                train.push(index);
            }
        }
    }

    train.sort_unstable();
    validation.sort_unstable();
    (train, validation)
}

/// Fit and validate a candidate model without touching disk
pub fn fit_candidate(table: &Table, config: &TrainingConfig) -> Result<FittedCandidate> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(AppError::Validation(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    let prepared = prepare_training_data(table, config)?;
    let (train_idx, val_idx) = stratified_split(&prepared.labels, config.test_size);

    let train_table = prepared.features.select_rows(&train_idx);
    let val_table = prepared.features.select_rows(&val_idx);
    let y_train: Array1<bool> = train_idx.iter().map(|&i| prepared.labels[i]).collect();
    let y_val: Vec<bool> = val_idx.iter().map(|&i| prepared.labels[i]).collect();

    info!(
        n_train = train_idx.len(),
        n_validation = val_idx.len(),
        numerical = prepared.schema.numerical_features.len(),
        categorical = prepared.schema.categorical_features.len(),
        "Fitting churn model"
    );

    let preprocessor = Preprocessor::fit(
        &train_table,
        &prepared.schema.numerical_features,
        &prepared.schema.categorical_features,
    );
    let classifier = LogisticModel::fit(
        &preprocessor.transform(&train_table),
        &y_train,
        config.max_iterations,
    )?;
    let model = ChurnModel {
        preprocessor,
        classifier,
    };

    let scores = model.predict_table(&val_table).to_vec();
    let roc_auc = roc_auc(&y_val, &scores).ok_or_else(|| {
        AppError::Training("validation split must contain both classes".to_string())
    })?;
    let metrics = MetricsRecord {
        roc_auc,
        accuracy: accuracy(&y_val, &scores),
    };
    info!(roc_auc = metrics.roc_auc, accuracy = metrics.accuracy, "Validation metrics");

    let baseline = baseline_stats(&train_table, &prepared.schema.numerical_features);

    Ok(FittedCandidate {
        artifacts: TrainedArtifacts {
            model,
            metrics,
            schema: prepared.schema,
            baseline,
        },
        n_train: train_idx.len(),
        n_validation: val_idx.len(),
    })
}

/// Mean and sample standard deviation of each numerical column
pub fn baseline_stats(table: &Table, numerical: &[String]) -> BaselineStats {
    let numerical = numerical
        .iter()
        .map(|column| {
            let values: Vec<f64> = table
                .non_null(column)
                .into_iter()
                .filter_map(numeric_cell)
                .collect();
            let (mean, std) = mean_and_std(&values, 1);
            (column.clone(), ColumnStats { mean, std })
        })
        .collect();
    BaselineStats { numerical }
}

/// Train on the configured dataset and persist the result unconditionally
pub fn train(config: &Config) -> Result<TrainingRun> {
    let started_at = Utc::now();
    info!(path = %config.paths.data_path.display(), "Loading training data");
    let table = load_csv(&config.paths.data_path)?;

    let candidate = fit_candidate(&table, &config.training)?;
    ArtifactStore::new(&config.paths).save(&candidate.artifacts)?;

    let record = run_record(config, RunKind::Train, started_at, &candidate, None, true);
    let run_record = write_run_record(&config.paths.runs_dir, &record)?;
    info!(run_id = %record.run_id, "Training run recorded");

    Ok(TrainingRun {
        metrics: candidate.artifacts.metrics,
        run_record,
    })
}

pub(crate) fn run_record(
    config: &Config,
    kind: RunKind,
    started_at: DateTime<Utc>,
    candidate: &FittedCandidate,
    guard_decision: Option<&str>,
    persisted: bool,
) -> RunRecord {
    let training = &config.training;
    let params = BTreeMap::from([
        ("model".to_string(), Value::from("logistic_regression")),
        ("max_iterations".to_string(), Value::from(training.max_iterations)),
        ("test_size".to_string(), Value::from(training.test_size)),
        ("target".to_string(), Value::from(training.target_column.clone())),
        (
            "n_features".to_string(),
            Value::from(candidate.artifacts.model.preprocessor.n_features()),
        ),
    ]);

    RunRecord {
        run_id: Uuid::new_v4(),
        experiment: training.experiment_name.clone(),
        kind,
        started_at,
        finished_at: Utc::now(),
        params,
        metrics: candidate.artifacts.metrics,
        n_train: candidate.n_train,
        n_validation: candidate.n_validation,
        guard_decision: guard_decision.map(str::to_string),
        persisted,
    }
}
