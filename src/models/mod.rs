//! Domain models for the flattening pipeline.
//!
//! The parsed document and every table cell share one representation:
//! [`serde_json::Value`] with insertion-ordered maps (`preserve_order`).
//! The XML importer only ever produces four variants:
//!
//! - `Null` - empty cell
//! - `String` / `Number` - scalar
//! - `Object` - record (ordered key -> value mapping)
//! - `Array` - list (ordered sequence)
//!
//! A [`Table`] is an ordered list of unique column labels plus one map per
//! row. A key absent from a row map is an empty cell, so rows stay sparse
//! across ragged data.

use serde::Serialize;
use serde_json::{Map, Value};

/// A flat working table: ordered unique column labels + map-shaped rows.
///
/// Cloning a `Table` produces the independent snapshot the undo history
/// stores; rows own their values, so mutating the live table never touches
/// a stored copy.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Table {
    /// Column labels, unique after every operator completes.
    pub columns: Vec<String>,
    /// One map per row; missing keys are empty cells.
    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    /// Create a table from columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Map<String, Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether a column label exists.
    pub fn has_column(&self, label: &str) -> bool {
        self.columns.iter().any(|c| c == label)
    }

    /// Cell at (row, column); `None` and `Null` both mean empty.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Columns holding at least one non-empty record or list cell.
    ///
    /// These are the candidates for the explode and extract operators.
    pub fn object_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|col| {
                self.rows
                    .iter()
                    .any(|row| row.get(col.as_str()).is_some_and(is_nested))
            })
            .cloned()
            .collect()
    }
}

/// Whether a cell holds nested structure (record or list).
pub fn is_nested(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Render a cell to its text representation.
///
/// Scalars keep their literal text, numbers print as written, nested
/// records and lists collapse to compact JSON, empty cells render as "".
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}
