//! Tabular data shared by the monitoring and training stages
//!
//! A [`Table`] is a list of rows, each a mapping from column name to a scalar
//! JSON value. Rows need not share the same keys; the column set is the union
//! of all keys in first-seen order and absent cells read as null.

pub mod csv_source;
pub mod table;

pub use csv_source::{load_csv, parse_cell};
pub use table::{Row, Table};
