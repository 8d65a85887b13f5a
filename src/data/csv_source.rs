//! CSV loading for the labeled churn dataset

use super::table::{Row, Table};
use crate::error::{AppError, Result};
use csv::ReaderBuilder;
use serde_json::{Number, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Load a headed CSV file into a [`Table`], inferring scalar types per cell
pub fn load_csv(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| {
        AppError::Data(format!("Cannot open dataset {}: {}", path.display(), e))
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(AppError::Data(format!("{} has no header row", path.display())));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter_map(|(name, cell)| parse_cell(cell).map(|v| (name.clone(), v)))
            .collect();
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), columns = headers.len(), "Loaded CSV dataset");

    Ok(Table::with_columns(headers, rows))
}

/// Infer a scalar from a CSV cell; empty cells are missing values
pub fn parse_cell(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match raw {
        "True" | "true" | "TRUE" => return Some(Value::Bool(true)),
        "False" | "false" | "FALSE" => return Some(Value::Bool(false)),
        _ => {}
    }

    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }

    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Some(Value::Number(n));
        }
    }

    Some(Value::String(raw.to_string()))
}
