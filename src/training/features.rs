use crate::data::{Row, Table};
use crate::monitoring::drift::category_label;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Standard scaling of one numerical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation; 1.0 for constant columns
    pub scale: f64,
}

impl NumericScaler {
    fn fit(column: &str, table: &Table) -> Self {
        let values: Vec<f64> = table
            .non_null(column)
            .into_iter()
            .filter_map(numeric_cell)
            .collect();

        let (mean, std) = mean_and_std(&values, 0);
        Self {
            column: column.to_string(),
            mean,
            scale: if std > 0.0 && std.is_finite() { std } else { 1.0 },
        }
    }

    /// Missing or non-numeric input is imputed with the mean
    fn transform(&self, value: Option<&Value>) -> f64 {
        let x = value.and_then(numeric_cell).unwrap_or(self.mean);
        (x - self.mean) / self.scale
    }
}

/// One-hot encoding of one categorical column; unknown categories encode as all zeros
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub column: String,
    /// Sorted categories seen during fit
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    fn fit(column: &str, table: &Table) -> Self {
        let categories: BTreeSet<String> = table
            .non_null(column)
            .into_iter()
            .map(category_label)
            .collect();
        Self {
            column: column.to_string(),
            categories: categories.into_iter().collect(),
        }
    }

    fn transform_into(&self, value: Option<&Value>, out: &mut [f64]) {
        out.iter_mut().for_each(|x| *x = 0.0);
        if let Some(value) = value {
            let label = category_label(value);
            if let Ok(index) = self.categories.binary_search(&label) {
                out[index] = 1.0;
            }
        }
    }
}

/// Column transformer: scaled numericals followed by one-hot categoricals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numerical: Vec<NumericScaler>,
    pub categorical: Vec<OneHotEncoder>,
}

impl Preprocessor {
    pub fn fit(table: &Table, numerical: &[String], categorical: &[String]) -> Self {
        Self {
            numerical: numerical
                .iter()
                .map(|c| NumericScaler::fit(c, table))
                .collect(),
            categorical: categorical
                .iter()
                .map(|c| OneHotEncoder::fit(c, table))
                .collect(),
        }
    }

    /// Width of the encoded feature vector
    pub fn n_features(&self) -> usize {
        self.numerical.len()
            + self
                .categorical
                .iter()
                .map(|e| e.categories.len())
                .sum::<usize>()
    }

    pub fn transform_row(&self, row: &Row) -> Vec<f64> {
        let mut out = vec![0.0; self.n_features()];
        self.encode_into(row, &mut out);
        out
    }

    pub fn transform(&self, table: &Table) -> Array2<f64> {
        let mut matrix = Array2::zeros((table.len(), self.n_features()));
        for (i, row) in table.rows().iter().enumerate() {
            if let Some(slice) = matrix.row_mut(i).as_slice_mut() {
                self.encode_into(row, slice);
            }
        }
        matrix
    }

    fn encode_into(&self, row: &Row, out: &mut [f64]) {
        let cell = |column: &str| row.get(column).filter(|v| !v.is_null());

        let mut offset = 0;
        for scaler in &self.numerical {
            out[offset] = scaler.transform(cell(&scaler.column));
            offset += 1;
        }
        for encoder in &self.categorical {
            let width = encoder.categories.len();
            encoder.transform_into(cell(&encoder.column), &mut out[offset..offset + width]);
            offset += width;
        }
    }
}

/// Numeric reading of a cell; booleans are 0/1 and numeric strings are parsed
pub fn numeric_cell(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Mean and standard deviation with `ddof` delta degrees of freedom
pub fn mean_and_std(values: &[f64], ddof: usize) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() <= ddof {
        return (mean, 0.0);
    }
    let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - ddof as f64);
    (mean, var.sqrt())
}
