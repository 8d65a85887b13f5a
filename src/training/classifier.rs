use super::features::Preprocessor;
use crate::data::{Row, Table};
use crate::error::{AppError, Result};
use linfa::prelude::*;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Binary logistic regression oriented so that probabilities refer to the positive (churn) class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    /// Fit with L-BFGS via linfa-logistic
    pub fn fit(features: &Array2<f64>, labels: &Array1<bool>, max_iterations: u64) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(AppError::Training(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if !labels.iter().any(|&y| y) || labels.iter().all(|&y| y) {
            return Err(AppError::Training(
                "training labels contain a single class".to_string(),
            ));
        }

        let dataset = Dataset::new(features.clone(), labels.clone());
        let fitted = LogisticRegression::default()
            .max_iterations(max_iterations)
            .fit(&dataset)
            .map_err(|e| AppError::Training(format!("Failed to train logistic regression: {}", e)))?;

        let mut weights = fitted.params().to_vec();
        let mut intercept = fitted.intercept();

        // linfa picks the positive label itself; flip so the model scores `true`
        if !fitted.labels().pos.class {
            weights.iter_mut().for_each(|w| *w = -*w);
            intercept = -intercept;
        }

        Ok(Self { weights, intercept })
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Positive-class probability of one encoded sample
    pub fn probability(&self, x: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept;
        sigmoid(z)
    }

    pub fn predict_proba(&self, features: &Array2<f64>) -> Array1<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.probability(slice),
                None => self.probability(&row.to_vec()),
            })
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Preprocessing and classifier persisted together as the deployed model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnModel {
    pub preprocessor: Preprocessor,
    pub classifier: LogisticModel,
}

impl ChurnModel {
    /// Churn probability of one feature mapping
    pub fn predict_row(&self, row: &Row) -> f64 {
        self.classifier
            .probability(&self.preprocessor.transform_row(row))
    }

    pub fn predict_table(&self, table: &Table) -> Array1<f64> {
        self.classifier
            .predict_proba(&self.preprocessor.transform(table))
    }
}
