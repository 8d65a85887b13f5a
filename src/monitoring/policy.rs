//! Retrain decision policy

use super::drift::{DatasetDriftResult, DriftReport};
use tracing::{info, warn};

/// Outcome of applying the drift threshold to a report
#[derive(Debug, Clone, PartialEq)]
pub enum DriftDecision {
    /// No usable `DatasetDriftMetric`; retraining cannot be decided
    MetricMissing,
    /// Share of drifted columns below the threshold
    WithinThreshold(DatasetDriftResult),
    /// Share of drifted columns at or above the threshold
    Exceeded(DatasetDriftResult),
}

impl DriftDecision {
    pub fn warrants_retraining(&self) -> bool {
        matches!(self, DriftDecision::Exceeded(_))
    }

    /// Share of drifted columns, when the metric was present
    pub fn share(&self) -> Option<f64> {
        match self {
            DriftDecision::MetricMissing => None,
            DriftDecision::WithinThreshold(d) | DriftDecision::Exceeded(d) => {
                Some(d.share_of_drifted_columns)
            }
        }
    }
}

/// Classify a drift report against `threshold` (inclusive)
pub fn evaluate_drift_decision(report: &DriftReport, threshold: f64) -> DriftDecision {
    let Some(dataset) = report.dataset_drift() else {
        warn!("No DatasetDriftMetric found, cannot decide retraining");
        return DriftDecision::MetricMissing;
    };

    info!(
        drifted = dataset.number_of_drifted_columns,
        total = dataset.number_of_columns,
        share = dataset.share_of_drifted_columns,
        threshold,
        "Drifted features: {}/{} ({:.2}%)",
        dataset.number_of_drifted_columns,
        dataset.number_of_columns,
        dataset.share_of_drifted_columns * 100.0
    );

    if dataset.share_of_drifted_columns >= threshold {
        DriftDecision::Exceeded(dataset)
    } else {
        DriftDecision::WithinThreshold(dataset)
    }
}

/// Whether the report warrants retraining at `threshold`
pub fn should_retrain(report: &DriftReport, threshold: f64) -> bool {
    evaluate_drift_decision(report, threshold).warrants_retraining()
}
