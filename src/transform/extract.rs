//! Column decomposition: pull URL-like strings out of a nested column
//! into fixed-width numbered columns.

use serde_json::{Map, Value};

use crate::error::{TransformError, TransformResult};
use crate::models::Table;
use crate::parser::TEXT_KEY;

use super::dedup::clean_duplicate_columns;

/// Decompose column `column` into `<column>_1 .. <column>_w` URL columns,
/// where `w` is the widest per-row URL count. The source column is dropped
/// and the new columns are appended; row count never changes. A column
/// yielding no URLs anywhere degenerates to a plain column drop.
pub fn extract_urls(table: &Table, column: &str) -> TransformResult<Table> {
    if !table.has_column(column) {
        return Err(TransformError::MissingColumn(column.to_string()));
    }

    let per_row: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.get(column).map(collect_urls).unwrap_or_default())
        .collect();

    let width = per_row.iter().map(Vec::len).max().unwrap_or(0);
    let sanitized = column.replace(['.', '>'], "_");
    let new_columns: Vec<String> = (1..=width)
        .map(|i| format!("{}_{}", sanitized, i))
        .collect();

    let rows: Vec<Map<String, Value>> = table
        .rows
        .iter()
        .zip(per_row)
        .map(|(row, urls)| {
            let mut out = row.clone();
            out.shift_remove(column);
            for (label, url) in new_columns.iter().zip(urls) {
                out.insert(label.clone(), Value::String(url));
            }
            out
        })
        .collect();

    let mut columns: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.as_str() != column)
        .cloned()
        .collect();
    columns.extend(new_columns);

    Ok(clean_duplicate_columns(Table::new(columns, rows)))
}

/// Depth-first crawl collecting URL-like strings, deduplicated by exact
/// equality with first occurrence kept.
///
/// Two shapes count as URL-like: a record whose literal `"#text"` key holds
/// a string containing `"http"`, and any bare string longer than ten
/// characters containing `"http"` or `"www"`.
pub fn collect_urls(cell: &Value) -> Vec<String> {
    let mut found = Vec::new();
    crawl(cell, &mut found);

    let mut unique = Vec::with_capacity(found.len());
    for url in found {
        if !unique.contains(&url) {
            unique.push(url);
        }
    }
    unique
}

fn crawl(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get(TEXT_KEY) {
                if text.contains("http") {
                    found.push(text.clone());
                }
            }
            for child in map.values() {
                crawl(child, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                crawl(item, found);
            }
        }
        Value::String(s) => {
            if s.chars().count() > 10 && (s.contains("http") || s.contains("www")) {
                found.push(s.clone());
            }
        }
        _ => {}
    }
}
