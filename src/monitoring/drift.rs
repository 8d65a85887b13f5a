//! Drift report schema and the default statistical evaluator

use super::stats::{chi_square_goodness_of_fit, ks_two_sample};
use crate::data::Table;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Aggregate dataset drift entry name
pub const DATASET_DRIFT_METRIC: &str = "DatasetDriftMetric";

/// Per-column drift table entry name
pub const DATA_DRIFT_TABLE: &str = "DataDriftTable";

/// Structured drift report: a list of named metric results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    #[serde(default)]
    pub metrics: Vec<MetricResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric: String,
    #[serde(default)]
    pub result: Value,
}

/// Aggregate statistics of the `DatasetDriftMetric` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDriftResult {
    pub number_of_columns: usize,
    pub number_of_drifted_columns: usize,
    pub share_of_drifted_columns: f64,
    #[serde(default)]
    pub drift_share: f64,
    #[serde(default)]
    pub dataset_drift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Num,
    Cat,
}

/// Drift verdict for a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub column_name: String,
    pub column_type: ColumnType,
    pub stattest_name: String,
    pub stattest_threshold: f64,
    /// p-value of the test
    pub drift_score: f64,
    pub statistic: f64,
    pub drift_detected: bool,
    pub reference_count: usize,
    pub current_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDriftTableResult {
    pub number_of_columns: usize,
    pub number_of_drifted_columns: usize,
    pub share_of_drifted_columns: f64,
    pub drift_by_columns: HashMap<String, ColumnDrift>,
}

impl DriftReport {
    /// Assemble a report from per-column verdicts
    pub fn from_columns(columns: Vec<ColumnDrift>, drift_share: f64) -> Self {
        let number_of_columns = columns.len();
        let number_of_drifted_columns = columns.iter().filter(|c| c.drift_detected).count();
        let share_of_drifted_columns = if number_of_columns == 0 {
            0.0
        } else {
            number_of_drifted_columns as f64 / number_of_columns as f64
        };

        let dataset = DatasetDriftResult {
            number_of_columns,
            number_of_drifted_columns,
            share_of_drifted_columns,
            drift_share,
            dataset_drift: number_of_columns > 0 && share_of_drifted_columns >= drift_share,
        };
        let table = DataDriftTableResult {
            number_of_columns,
            number_of_drifted_columns,
            share_of_drifted_columns,
            drift_by_columns: columns
                .into_iter()
                .map(|c| (c.column_name.clone(), c))
                .collect(),
        };

        Self {
            metrics: vec![
                MetricResult {
                    metric: DATASET_DRIFT_METRIC.to_string(),
                    result: serde_json::to_value(dataset).unwrap_or(Value::Null),
                },
                MetricResult {
                    metric: DATA_DRIFT_TABLE.to_string(),
                    result: serde_json::to_value(table).unwrap_or(Value::Null),
                },
            ],
        }
    }

    /// Raw result of the first metric named `name`
    pub fn metric(&self, name: &str) -> Option<&Value> {
        self.metrics
            .iter()
            .find(|m| m.metric == name)
            .map(|m| &m.result)
    }

    /// Aggregate dataset drift, if present and well-formed
    pub fn dataset_drift(&self) -> Option<DatasetDriftResult> {
        self.metric(DATASET_DRIFT_METRIC)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Per-column verdicts, sorted by column name
    pub fn column_drifts(&self) -> Vec<ColumnDrift> {
        let mut columns: Vec<ColumnDrift> = self
            .metric(DATA_DRIFT_TABLE)
            .and_then(|v| serde_json::from_value::<DataDriftTableResult>(v.clone()).ok())
            .map(|t| t.drift_by_columns.into_values().collect())
            .unwrap_or_default();
        columns.sort_by(|a, b| a.column_name.cmp(&b.column_name));
        columns
    }
}

/// Computes a drift report from a reference and a current table
pub trait DriftEvaluator {
    fn evaluate(&self, reference: &Table, current: &Table) -> Result<DriftReport>;
}

/// KS test for numeric columns, chi-square for everything else
#[derive(Debug, Clone)]
pub struct StatisticalDriftEvaluator {
    /// p-value below which a column is drifted
    pub stattest_threshold: f64,
    /// Share of drifted columns flagging dataset drift
    pub drift_share: f64,
}

impl Default for StatisticalDriftEvaluator {
    fn default() -> Self {
        Self {
            stattest_threshold: 0.05,
            drift_share: 0.5,
        }
    }
}

impl StatisticalDriftEvaluator {
    pub fn new(stattest_threshold: f64, drift_share: f64) -> Self {
        Self {
            stattest_threshold,
            drift_share,
        }
    }

    fn evaluate_column(&self, name: &str, reference: &[&Value], current: &[&Value]) -> ColumnDrift {
        let numeric = |values: &[&Value]| -> Option<Vec<f64>> {
            values.iter().map(|v| numeric_value(v)).collect()
        };

        let (column_type, stattest_name, statistic, p_value) =
            match (numeric(reference), numeric(current)) {
                (Some(r), Some(c)) => {
                    let (d, p) = ks_two_sample(&r, &c);
                    (ColumnType::Num, "K-S p_value", d, p)
                }
                _ => {
                    let (chi, p) = chi_square_goodness_of_fit(
                        &category_counts(reference),
                        &category_counts(current),
                    );
                    (ColumnType::Cat, "chi-square p_value", chi, p)
                }
            };

        ColumnDrift {
            column_name: name.to_string(),
            column_type,
            stattest_name: stattest_name.to_string(),
            stattest_threshold: self.stattest_threshold,
            drift_score: p_value,
            statistic,
            drift_detected: p_value < self.stattest_threshold,
            reference_count: reference.len(),
            current_count: current.len(),
        }
    }
}

impl DriftEvaluator for StatisticalDriftEvaluator {
    fn evaluate(&self, reference: &Table, current: &Table) -> Result<DriftReport> {
        let mut columns = Vec::new();

        for name in reference.columns() {
            let ref_values = reference.non_null(name);
            let cur_values = current.non_null(name);
            if ref_values.is_empty() || cur_values.is_empty() {
                debug!(column = %name, "Column has no comparable values, not analysed");
                continue;
            }
            columns.push(self.evaluate_column(name, &ref_values, &cur_values));
        }

        Ok(DriftReport::from_columns(columns, self.drift_share))
    }
}

/// Numeric reading of a cell; booleans count as 0/1
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn category_counts(values: &[&Value]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for value in values {
        *counts.entry(category_label(value)).or_insert(0) += 1;
    }
    counts
}

/// Textual category of a cell, shared with one-hot encoding
pub fn category_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use serde_json::json;

    fn table(rows: Vec<Value>) -> Table {
        Table::from_rows(
            rows.into_iter()
                .map(|r| serde_json::from_value::<Row>(r).unwrap())
                .collect(),
        )
    }

    fn reference() -> Table {
        table(
            (0..300)
                .map(|i| {
                    json!({
                        "Total day minutes": 100.0 + (i % 100) as f64,
                        "International plan": if i % 10 == 0 { "Yes" } else { "No" },
                    })
                })
                .collect(),
        )
    }

    #[test]
    fn test_no_drift_on_same_distribution() {
        let report = StatisticalDriftEvaluator::default()
            .evaluate(&reference(), &reference())
            .unwrap();
        let dataset = report.dataset_drift().unwrap();

        assert_eq!(dataset.number_of_columns, 2);
        assert_eq!(dataset.number_of_drifted_columns, 0);
        assert_eq!(dataset.share_of_drifted_columns, 0.0);
        assert!(!dataset.dataset_drift);
    }

    #[test]
    fn test_detects_shift_in_both_column_types() {
        let current = table(
            (0..100)
                .map(|i| {
                    json!({
                        "Total day minutes": 300.0 + i as f64,
                        "International plan": "Yes",
                    })
                })
                .collect(),
        );
        let report = StatisticalDriftEvaluator::default()
            .evaluate(&reference(), &current)
            .unwrap();
        let dataset = report.dataset_drift().unwrap();

        assert_eq!(dataset.number_of_drifted_columns, 2);
        assert_eq!(dataset.share_of_drifted_columns, 1.0);
        assert!(dataset.dataset_drift);

        let columns = report.column_drifts();
        assert_eq!(columns[0].column_name, "International plan");
        assert_eq!(columns[0].column_type, ColumnType::Cat);
        assert_eq!(columns[1].column_type, ColumnType::Num);
    }

    #[test]
    fn test_columns_missing_from_current_are_not_analysed() {
        let current = table(vec![json!({"Total day minutes": 150.0})]);
        let report = StatisticalDriftEvaluator::default()
            .evaluate(&reference(), &current)
            .unwrap();

        assert_eq!(report.dataset_drift().unwrap().number_of_columns, 1);
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = DriftReport::from_columns(Vec::new(), 0.5);
        let text = serde_json::to_string(&report).unwrap();
        let parsed: DriftReport = serde_json::from_str(&text).unwrap();

        let dataset = parsed.dataset_drift().unwrap();
        assert_eq!(dataset.number_of_columns, 0);
        assert!(!dataset.dataset_drift);
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label(&json!("CA")), "CA");
        assert_eq!(category_label(&json!(415)), "415");
        assert_eq!(category_label(&json!(true)), "True");
    }
}
