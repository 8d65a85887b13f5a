/// End-to-end tests of the monitoring loop
///
/// Served predictions are written through the API log writer, evaluated
/// against the training dataset, and retraining runs in-process behind the
/// quality guard.

mod common;

use chrono::{Duration, Utc};
use churn_sentinel::config::Config;
use churn_sentinel::error::Result;
use churn_sentinel::metrics::{init_metrics, write_textfile};
use churn_sentinel::monitoring::{
    NoDataReason, RetrainOrchestrator, RetrainStateLoad, RunOutcome, StatisticalDriftEvaluator,
    TrainingLauncher,
};
use churn_sentinel::training::{retrain_with_guard, train};
use common::{customer, shifted_customer, Workspace};
use std::fs;

/// Runs the guarded retraining in the current process
struct InProcessLauncher {
    config: Config,
}

impl TrainingLauncher for InProcessLauncher {
    fn launch(&self) -> Result<()> {
        retrain_with_guard(&self.config).map(|_| ())
    }
}

fn orchestrator(ws: &Workspace) -> RetrainOrchestrator<StatisticalDriftEvaluator, InProcessLauncher> {
    RetrainOrchestrator::new(
        &ws.config,
        StatisticalDriftEvaluator::default(),
        InProcessLauncher {
            config: ws.config.clone(),
        },
    )
}

fn report_count(ws: &Workspace) -> usize {
    fs::read_dir(&ws.config.paths.reports_dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[test]
fn test_empty_log_is_a_no_op() {
    let ws = Workspace::with_dataset(200);
    ws.log_predictions(Vec::new());

    let outcome = orchestrator(&ws).run().unwrap();

    assert_eq!(outcome, RunOutcome::NoData(NoDataReason::NoPredictionRecords));
    assert_eq!(report_count(&ws), 0);
    assert_eq!(
        RetrainStateLoad::read(&ws.config.paths.retrain_state_path()),
        RetrainStateLoad::Missing
    );
}

#[test]
fn test_traffic_like_training_data_needs_no_retraining() {
    let ws = Workspace::with_dataset(200);
    train(&ws.config).unwrap();
    ws.log_predictions((0..200).map(customer));

    let outcome = orchestrator(&ws).run().unwrap();

    match &outcome {
        RunOutcome::NoDrift { share, .. } => assert_eq!(*share, 0.0),
        other => panic!("expected no drift, got {:?}", other),
    }
    assert_eq!(report_count(&ws), 2);
    assert!(!ws.config.paths.retrain_state_path().exists());
}

#[test]
fn test_run_outcomes_are_exported_to_textfile() {
    let ws = Workspace::with_dataset(200);
    ws.log_predictions((0..200).map(customer));
    let _ = init_metrics();

    let outcome = orchestrator(&ws).run().unwrap();
    assert_eq!(outcome.label(), "no_drift");

    let path = ws.config.paths.metrics_textfile_path();
    write_textfile(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("churn_sentinel_retrain_runs_total{outcome=\"no_drift\"}"));
    assert!(text.contains("churn_sentinel_drift_share"));
}

#[test]
fn test_drift_retrains_then_cooldown_blocks() {
    let ws = Workspace::with_dataset(200);
    train(&ws.config).unwrap();
    ws.log_predictions((0..100).map(shifted_customer));

    let orch = orchestrator(&ws);
    let now = Utc::now();

    let first = orch.run_at(now).unwrap();
    match &first {
        RunOutcome::Retrained { share, .. } => assert!(*share >= ws.config.monitoring.drift_threshold),
        other => panic!("expected retraining, got {:?}", other),
    }
    let recorded = RetrainStateLoad::read(&ws.config.paths.retrain_state_path())
        .last_retrain()
        .unwrap();
    assert_eq!(recorded.timestamp_millis(), now.timestamp_millis());

    let second = orch.run_at(now + Duration::hours(2)).unwrap();
    assert!(matches!(second, RunOutcome::BlockedByCooldown { .. }));
    assert!(second.report().unwrap().summary_path.exists());

    let third = orch.run_at(now + Duration::hours(25)).unwrap();
    assert!(third.retrained());
}

#[test]
fn test_zero_cooldown_never_blocks() {
    let mut ws = Workspace::with_dataset(200);
    ws.config.monitoring.cooldown_hours = 0.0;
    train(&ws.config).unwrap();
    ws.log_predictions((0..100).map(shifted_customer));

    let orch = orchestrator(&ws);
    let now = Utc::now();
    assert!(orch.run_at(now).unwrap().retrained());
    assert!(orch.run_at(now).unwrap().retrained());
}

#[cfg(unix)]
#[test]
fn test_failing_training_process_is_an_error() {
    let mut ws = Workspace::with_dataset(200);
    ws.config.training.command = vec!["sh".to_string(), "-c".to_string(), "exit 2".to_string()];
    ws.log_predictions((0..100).map(shifted_customer));

    let orch = RetrainOrchestrator::from_config(&ws.config, None).unwrap();
    assert!(orch.run().is_err());

    assert_eq!(
        RetrainStateLoad::read(&ws.config.paths.retrain_state_path()),
        RetrainStateLoad::Missing
    );
    assert_eq!(report_count(&ws), 2);
}

#[cfg(unix)]
#[test]
fn test_successful_training_process_records_state() {
    let mut ws = Workspace::with_dataset(200);
    ws.config.training.command = vec!["sh".to_string(), "-c".to_string(), "exit 0".to_string()];
    ws.log_predictions((0..100).map(shifted_customer));

    let orch = RetrainOrchestrator::from_config(&ws.config, None).unwrap();
    assert!(orch.run().unwrap().retrained());
    assert!(orch.cooldown().state_path().exists());
}
