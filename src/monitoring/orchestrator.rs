//! Drift check and retraining orchestration
//!
//! One run reads served predictions, compares them against the training
//! reference, persists the drift report and, when drift warrants it and the
//! cooldown allows, launches retraining and records the trigger.

use super::cooldown::CooldownGuard;
use super::drift::{DriftEvaluator, StatisticalDriftEvaluator};
use super::launcher::{ProcessTrainingLauncher, TrainingLauncher};
use super::log_reader::load_inference_data;
use super::policy::{evaluate_drift_decision, DriftDecision};
use super::report::{write_report, DriftArtifacts};
use crate::config::Config;
use crate::data::{load_csv, Table};
use crate::error::Result;
use crate::metrics::{DRIFT_SHARE, RETRAIN_RUNS_TOTAL};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use strum::{Display, IntoStaticStr};
use tracing::{error, info, warn};

/// Why a run stopped before evaluating drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum NoDataReason {
    NoInferenceLog,
    NoPredictionRecords,
}

/// Terminal state of one orchestrator run
#[derive(Debug, Clone, PartialEq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing to evaluate
    NoData(NoDataReason),
    /// Report persisted but carried no usable dataset drift metric
    DriftMetricMissing { report: DriftArtifacts },
    /// Drift share below the retrain threshold
    NoDrift { share: f64, report: DriftArtifacts },
    /// Drift warranted retraining but the cooldown is active
    BlockedByCooldown { share: f64, report: DriftArtifacts },
    /// Training ran to completion and the trigger was recorded
    Retrained { share: f64, report: DriftArtifacts },
}

impl RunOutcome {
    /// Metric label of the outcome
    pub fn label(&self) -> &'static str {
        self.into()
    }

    /// Drift report written by this run, if it reached evaluation
    pub fn report(&self) -> Option<&DriftArtifacts> {
        match self {
            RunOutcome::NoData(_) => None,
            RunOutcome::DriftMetricMissing { report }
            | RunOutcome::NoDrift { report, .. }
            | RunOutcome::BlockedByCooldown { report, .. }
            | RunOutcome::Retrained { report, .. } => Some(report),
        }
    }

    pub fn retrained(&self) -> bool {
        matches!(self, RunOutcome::Retrained { .. })
    }
}

/// Runs the monitoring loop once per call
pub struct RetrainOrchestrator<E = StatisticalDriftEvaluator, L = ProcessTrainingLauncher> {
    inference_log: PathBuf,
    reference_data: PathBuf,
    reports_dir: PathBuf,
    target_column: String,
    drift_threshold: f64,
    cooldown: CooldownGuard,
    evaluator: E,
    launcher: L,
}

impl RetrainOrchestrator {
    /// Default evaluator and subprocess launcher built from configuration
    ///
    /// `config_path` is forwarded to the training process.
    pub fn from_config(config: &Config, config_path: Option<&Path>) -> Result<Self> {
        let evaluator = StatisticalDriftEvaluator::new(
            config.monitoring.stattest_threshold,
            config.monitoring.drift_share,
        );
        let launcher = ProcessTrainingLauncher::from_command(&config.training.command)?
            .with_config_path(config_path);
        Ok(Self::new(config, evaluator, launcher))
    }
}

impl<E: DriftEvaluator, L: TrainingLauncher> RetrainOrchestrator<E, L> {
    pub fn new(config: &Config, evaluator: E, launcher: L) -> Self {
        Self {
            inference_log: config.paths.inference_log.clone(),
            reference_data: config.paths.data_path.clone(),
            reports_dir: config.paths.reports_dir.clone(),
            target_column: config.training.target_column.clone(),
            drift_threshold: config.monitoring.drift_threshold,
            cooldown: CooldownGuard::new(
                config.paths.retrain_state_path(),
                config.monitoring.cooldown_hours,
            ),
            evaluator,
            launcher,
        }
    }

    pub fn cooldown(&self) -> &CooldownGuard {
        &self.cooldown
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now())
    }

    /// Run once with `now` as the clock reading for reports and cooldown
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let result = self.execute(now);
        match &result {
            Ok(outcome) => {
                RETRAIN_RUNS_TOTAL.with_label_values(&[outcome.label()]).inc();
            }
            Err(e) => {
                error!(error = %e, "Drift check failed");
                RETRAIN_RUNS_TOTAL.with_label_values(&["failed"]).inc();
            }
        }
        result
    }

    fn execute(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        if !self.inference_log.exists() {
            warn!(path = %self.inference_log.display(), "No inference log found, skipping drift check");
            return Ok(RunOutcome::NoData(NoDataReason::NoInferenceLog));
        }

        let current = load_inference_data(&self.inference_log)?;
        if current.is_empty() {
            warn!("No prediction records in inference log, skipping drift check");
            return Ok(RunOutcome::NoData(NoDataReason::NoPredictionRecords));
        }

        let reference = self.load_reference()?;
        info!(
            reference_rows = reference.len(),
            current_rows = current.len(),
            "Evaluating drift"
        );

        let report = self.evaluator.evaluate(&reference, &current)?;
        let artifacts = write_report(&report, &self.reports_dir, now)?;
        info!(
            summary = %artifacts.summary_path.display(),
            html = %artifacts.html_path.display(),
            "Drift report saved"
        );

        let share = match evaluate_drift_decision(&report, self.drift_threshold) {
            DriftDecision::MetricMissing => {
                return Ok(RunOutcome::DriftMetricMissing { report: artifacts });
            }
            DriftDecision::WithinThreshold(dataset) => {
                DRIFT_SHARE.set(dataset.share_of_drifted_columns);
                info!("No retraining needed");
                return Ok(RunOutcome::NoDrift {
                    share: dataset.share_of_drifted_columns,
                    report: artifacts,
                });
            }
            DriftDecision::Exceeded(dataset) => {
                DRIFT_SHARE.set(dataset.share_of_drifted_columns);
                dataset.share_of_drifted_columns
            }
        };

        if !self.cooldown.can_retrain(now) {
            warn!("Drift detected but retraining blocked by cooldown");
            return Ok(RunOutcome::BlockedByCooldown {
                share,
                report: artifacts,
            });
        }

        info!(share, threshold = self.drift_threshold, "Drift exceeded threshold, retraining");
        self.launcher.launch()?;
        self.cooldown.record_retrain(now)?;
        info!("Retraining completed");

        Ok(RunOutcome::Retrained {
            share,
            report: artifacts,
        })
    }

    fn load_reference(&self) -> Result<Table> {
        let reference = load_csv(&self.reference_data)?;
        Ok(reference.drop_column(&self.target_column))
    }
}
