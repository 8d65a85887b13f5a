use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validation metrics persisted next to the deployed model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Area under the ROC curve on the validation split
    pub roc_auc: f64,

    /// Accuracy at a 0.5 decision threshold
    pub accuracy: f64,
}

/// Feature layout the model was trained on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSchema {
    pub categorical_features: Vec<String>,
    pub numerical_features: Vec<String>,
    /// Input columns in training order
    pub all_features: Vec<String>,
    pub target: String,
}

impl TrainSchema {
    /// Schema features absent from `present`, in schema order
    pub fn missing_features<'a, F>(&'a self, present: F) -> Vec<&'a str>
    where
        F: Fn(&str) -> bool,
    {
        self.all_features
            .iter()
            .map(String::as_str)
            .filter(|name| !present(name))
            .collect()
    }
}

/// Mean and sample standard deviation of a numerical feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

/// Training-time distribution summary of numerical features
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub numerical: BTreeMap<String, ColumnStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_format() {
        let json = serde_json::to_value(MetricsRecord {
            roc_auc: 0.91,
            accuracy: 0.88,
        })
        .unwrap();
        assert_eq!(json["roc_auc"], 0.91);
        assert_eq!(json["accuracy"], 0.88);
    }

    #[test]
    fn test_missing_features_keeps_schema_order() {
        let schema = TrainSchema {
            categorical_features: vec!["State".to_string()],
            numerical_features: vec!["Account length".to_string(), "Total day calls".to_string()],
            all_features: vec![
                "State".to_string(),
                "Account length".to_string(),
                "Total day calls".to_string(),
            ],
            target: "Churn".to_string(),
        };

        let missing = schema.missing_features(|name| name == "Account length");
        assert_eq!(missing, vec!["State", "Total day calls"]);
    }
}
