use serde_json::{Map, Value};
use std::collections::HashSet;

/// One table row: column name to scalar value, in insertion order
pub type Row = Map<String, Value>;

/// Row-oriented table with a tolerant schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Union of all row keys, in first-seen order
    columns: Vec<String>,

    /// Rows; missing keys are nulls
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows, deriving the column set
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Build a table with a fixed column order (e.g. a CSV header)
    pub fn with_columns(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut table = Self {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row, extending the column set with any new keys
    pub fn push_row(&mut self, row: Row) {
        let known: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let new_columns: Vec<String> = row
            .keys()
            .filter(|k| !known.contains(k.as_str()))
            .cloned()
            .collect();
        self.columns.extend(new_columns);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell value; `None` for missing keys and explicit nulls alike
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .filter(|v| !v.is_null())
    }

    /// All cells of a column, one per row
    pub fn column(&self, name: &str) -> Vec<Option<&Value>> {
        (0..self.rows.len()).map(|i| self.get(i, name)).collect()
    }

    /// Non-null cells of a column
    pub fn non_null(&self, name: &str) -> Vec<&Value> {
        self.column(name).into_iter().flatten().collect()
    }

    /// Copy of this table without `name`
    pub fn drop_column(&self, name: &str) -> Table {
        let columns = self.columns.iter().filter(|c| *c != name).cloned().collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.remove(name);
                row
            })
            .collect();
        Table { columns, rows }
    }

    /// Rows selected by index, preserving the column order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}
