//! Search/filter view over the working table.
//!
//! Matching is a case-insensitive substring test against the rendered
//! text of each cell, over one chosen column or all of them. The result
//! is a copied view; the live table and the history are never touched.

use crate::error::{TransformError, TransformResult};
use crate::models::{render_cell, Table};

/// Filter rows by a case-insensitive substring match.
///
/// An empty query matches everything. With `column` set, only that
/// column is tested; otherwise any column may match.
pub fn filter_table(table: &Table, column: Option<&str>, query: &str) -> TransformResult<Table> {
    if let Some(col) = column {
        if !table.has_column(col) {
            return Err(TransformError::MissingColumn(col.to_string()));
        }
    }

    if query.is_empty() {
        return Ok(table.clone());
    }

    let needle = query.to_lowercase();
    let rows = table
        .rows
        .iter()
        .filter(|row| match column {
            Some(col) => cell_matches(row.get(col).map(|v| render_cell(Some(v))), &needle),
            None => table
                .columns
                .iter()
                .any(|col| cell_matches(row.get(col.as_str()).map(|v| render_cell(Some(v))), &needle)),
        })
        .cloned()
        .collect();

    Ok(Table::new(table.columns.clone(), rows))
}

fn cell_matches(rendered: Option<String>, needle: &str) -> bool {
    rendered.is_some_and(|text| text.to_lowercase().contains(needle))
}
