/// Churn model training
///
/// This module provides:
/// - Dataset preparation and a deterministic stratified split
/// - Standard scaling and one-hot preprocessing
/// - Logistic regression fitting (linfa-logistic)
/// - ROC-AUC / accuracy validation
/// - Artifact persistence, run records and the retraining quality guard

pub mod artifacts;
pub mod classifier;
pub mod evaluation;
pub mod features;
pub mod guard;
pub mod models;
pub mod pipeline;
pub mod tracking;

pub use artifacts::{ArtifactStore, TrainedArtifacts};
pub use classifier::{ChurnModel, LogisticModel};
pub use features::Preprocessor;
pub use guard::{is_model_better, retrain_with_guard, GuardOutcome};
pub use models::{BaselineStats, ColumnStats, MetricsRecord, TrainSchema};
pub use pipeline::{fit_candidate, prepare_training_data, stratified_split, train, TrainingRun};
pub use tracking::{RunKind, RunRecord};
