//! Drift monitoring and automated retraining
//!
//! Reads served predictions from the inference log, compares them against the
//! training reference, and decides whether to launch retraining.

pub mod cooldown;
pub mod drift;
pub mod launcher;
pub mod literal;
pub mod log_reader;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod stats;

pub use cooldown::{can_retrain, update_retrain_state, CooldownGuard, RetrainState, RetrainStateLoad};
pub use drift::{
    ColumnDrift, ColumnType, DatasetDriftResult, DriftEvaluator, DriftReport, MetricResult,
    StatisticalDriftEvaluator, DATASET_DRIFT_METRIC,
};
pub use launcher::{ProcessTrainingLauncher, TrainingLauncher};
pub use log_reader::{load_inference_data, PREDICTION_EVENT};
pub use orchestrator::{NoDataReason, RetrainOrchestrator, RunOutcome};
pub use policy::{evaluate_drift_decision, should_retrain, DriftDecision};
pub use report::{write_report, DriftArtifacts};
