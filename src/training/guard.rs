//! Quality guard for retraining
//!
//! A retrained candidate replaces the deployed model only when its ROC-AUC
//! does not fall more than the tolerance below the deployed one.

use super::artifacts::ArtifactStore;
use super::models::MetricsRecord;
use super::pipeline::{fit_candidate, run_record};
use super::tracking::{write_run_record, RunKind};
use crate::config::Config;
use crate::data::load_csv;
use crate::error::Result;
use crate::metrics::MODEL_CANDIDATES_TOTAL;
use chrono::Utc;
use strum::{Display, IntoStaticStr};
use tracing::{info, warn};

/// Whether a candidate scoring `new_score` may replace a model scoring `old_score`
///
/// Without a deployed model any candidate is accepted.
pub fn is_model_better(new_score: f64, old_score: Option<f64>, tolerance: f64) -> bool {
    match old_score {
        None => true,
        Some(old) => new_score >= old - tolerance,
    }
}

/// Decision taken by the guard for one candidate
#[derive(Debug, Clone, PartialEq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum GuardOutcome {
    /// Candidate persisted as the deployed model
    Accepted {
        candidate: MetricsRecord,
        previous: Option<MetricsRecord>,
    },
    /// Candidate discarded, deployed artifacts untouched
    Rejected {
        candidate: MetricsRecord,
        previous: Option<MetricsRecord>,
    },
}

impl GuardOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GuardOutcome::Accepted { .. })
    }

    pub fn label(&self) -> &'static str {
        self.into()
    }
}

/// Retrain on the configured dataset and persist only if the guard accepts
pub fn retrain_with_guard(config: &Config) -> Result<GuardOutcome> {
    let started_at = Utc::now();
    let store = ArtifactStore::new(&config.paths);
    let previous = store.load_metrics()?;

    let table = load_csv(&config.paths.data_path)?;
    let candidate = fit_candidate(&table, &config.training)?;
    let candidate_metrics = candidate.artifacts.metrics;

    let accepted = is_model_better(
        candidate_metrics.roc_auc,
        previous.map(|m| m.roc_auc),
        config.training.quality_tolerance,
    );

    let outcome = if accepted {
        store.save(&candidate.artifacts)?;
        info!(
            new_roc_auc = candidate_metrics.roc_auc,
            old_roc_auc = ?previous.map(|m| m.roc_auc),
            "New model accepted and saved"
        );
        GuardOutcome::Accepted {
            candidate: candidate_metrics,
            previous,
        }
    } else {
        warn!(
            new_roc_auc = candidate_metrics.roc_auc,
            old_roc_auc = ?previous.map(|m| m.roc_auc),
            tolerance = config.training.quality_tolerance,
            "New model rejected: quality below deployed model"
        );
        GuardOutcome::Rejected {
            candidate: candidate_metrics,
            previous,
        }
    };

    MODEL_CANDIDATES_TOTAL
        .with_label_values(&[outcome.label()])
        .inc();

    let record = run_record(
        config,
        RunKind::Retrain,
        started_at,
        &candidate,
        Some(outcome.label()),
        accepted,
    );
    write_run_record(&config.paths.runs_dir, &record)?;

    Ok(outcome)
}
