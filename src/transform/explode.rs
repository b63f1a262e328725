//! Row expansion: explode a nested-collection column into extra rows.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{TransformError, TransformResult};
use crate::models::Table;

use super::dedup::clean_duplicate_columns;
use super::flatten::flatten_value;

/// Explode column `column` of the table into one output row per nested
/// element, flattening record elements into `<column>.<subkey>` columns.
///
/// Every cell is first normalized to a non-empty sequence: a list passes
/// through, a record becomes a one-element sequence, and anything else
/// (scalar, empty cell, empty list) becomes a single sentinel empty record.
/// The sentinel guarantees each input row yields at least one output row,
/// so the row count never shrinks.
///
/// Sub-columns that collide with untouched columns win: the pre-expansion
/// column is dropped for every row, as is `column` itself.
pub fn explode(table: &Table, column: &str) -> TransformResult<Table> {
    if !table.has_column(column) {
        return Err(TransformError::MissingColumn(column.to_string()));
    }

    let mut sub_columns: Vec<String> = Vec::new();
    let mut seen_sub: HashSet<String> = HashSet::new();
    // (remaining row, flattened sub-record) per produced row
    let mut produced: Vec<(Map<String, Value>, Map<String, Value>)> = Vec::new();

    for row in &table.rows {
        let mut base = row.clone();
        let cell = base.shift_remove(column);

        let sequence = normalize_cell(cell);
        for element in sequence {
            let mut sub = Map::new();
            if element.is_object() {
                flatten_value(column, &element, &mut sub);
            }
            for key in sub.keys() {
                if seen_sub.insert(key.clone()) {
                    sub_columns.push(key.clone());
                }
            }
            produced.push((base.clone(), sub));
        }
    }

    // Pre-expansion columns shadowed by a sub-column lose for every row,
    // not just the rows that produced a sub-value.
    let overlap: HashSet<&str> = table
        .columns
        .iter()
        .filter(|c| seen_sub.contains(c.as_str()))
        .map(String::as_str)
        .collect();

    let rows: Vec<Map<String, Value>> = produced
        .into_iter()
        .map(|(mut base, sub)| {
            for label in &overlap {
                base.shift_remove(*label);
            }
            for (key, value) in sub {
                base.insert(key, value);
            }
            base
        })
        .collect();

    let mut columns: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.as_str() != column && !overlap.contains(c.as_str()))
        .cloned()
        .collect();
    columns.extend(sub_columns);

    Ok(clean_duplicate_columns(Table::new(columns, rows)))
}

/// Normalize a cell into the non-empty sequence the expansion iterates.
fn normalize_cell(cell: Option<Value>) -> Vec<Value> {
    match cell {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Object(map)) => vec![Value::Object(map)],
        // Scalar, empty cell or empty list: one sentinel empty record.
        _ => vec![Value::Object(Map::new())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_missing_column_rejected() {
        let table = Table::new(vec!["a".into()], vec![]);
        let err = explode(&table, "nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_two_records_become_two_rows() {
        let table = Table::new(
            vec!["code".into(), "variants".into()],
            vec![row(&[
                ("code", json!("A1")),
                (
                    "variants",
                    json!([{"size": "M", "qty": "2"}, {"size": "L", "qty": "1"}]),
                ),
            ])],
        );

        let result = explode(&table, "variants").unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(
            result.columns,
            vec!["code", "variants.size", "variants.qty"]
        );
        assert_eq!(result.rows[0]["code"], json!("A1"));
        assert_eq!(result.rows[1]["code"], json!("A1"));
        assert_eq!(result.rows[0]["variants.size"], json!("M"));
        assert_eq!(result.rows[0]["variants.qty"], json!("2"));
        assert_eq!(result.rows[1]["variants.size"], json!("L"));
        assert_eq!(result.rows[1]["variants.qty"], json!("1"));
    }

    #[test]
    fn test_scalar_only_column_preserves_row_count() {
        let table = Table::new(
            vec!["id".into(), "note".into()],
            vec![
                row(&[("id", json!("1")), ("note", json!("plain"))]),
                row(&[("id", json!("2"))]),
            ],
        );

        let result = explode(&table, "note").unwrap();

        // Each row yields exactly one sentinel-derived row.
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.columns, vec!["id"]);
    }

    #[test]
    fn test_row_count_is_sum_of_max_len_one() {
        let table = Table::new(
            vec!["id".into(), "v".into()],
            vec![
                row(&[("id", json!("1")), ("v", json!([{"a": 1}, {"a": 2}, {"a": 3}]))]),
                row(&[("id", json!("2")), ("v", json!([]))]),
                row(&[("id", json!("3")), ("v", json!({"a": 9}))]),
                row(&[("id", json!("4"))]),
            ],
        );

        let result = explode(&table, "v").unwrap();

        // 3 + max(0,1) + 1 + 1
        assert_eq!(result.row_count(), 6);
        assert!(result.cell(3, "v.a").is_none());
        assert_eq!(result.rows[4]["v.a"], json!(9));
    }

    #[test]
    fn test_sub_column_conflict_nested_wins() {
        // "v.size" exists as a flat column and is also produced by the
        // expansion; the nested-derived value must win everywhere.
        let table = Table::new(
            vec!["id".into(), "v.size".into(), "v".into()],
            vec![
                row(&[
                    ("id", json!("1")),
                    ("v.size", json!("stale")),
                    ("v", json!([{"size": "M"}])),
                ]),
                row(&[("id", json!("2")), ("v.size", json!("also-stale"))]),
            ],
        );

        let result = explode(&table, "v").unwrap();

        assert_eq!(result.columns, vec!["id", "v.size"]);
        assert_eq!(result.rows[0]["v.size"], json!("M"));
        // The shadowed pre-expansion value is gone even where no nested
        // element supplied a replacement.
        assert!(result.cell(1, "v.size").is_none());
    }

    #[test]
    fn test_scalar_list_elements_contribute_no_columns() {
        let table = Table::new(
            vec!["id".into(), "tags".into()],
            vec![row(&[("id", json!("1")), ("tags", json!(["a", "b"]))])],
        );

        let result = explode(&table, "tags").unwrap();

        // Two rows, but the scalar elements themselves are dropped.
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.columns, vec!["id"]);
    }

    #[test]
    fn test_nested_record_inside_element_flattens_deeply() {
        let table = Table::new(
            vec!["id".into(), "v".into()],
            vec![row(&[
                ("id", json!("1")),
                ("v", json!({"price": {"amount": "9"}})),
            ])],
        );

        let result = explode(&table, "v").unwrap();

        assert_eq!(result.columns, vec!["id", "v.price.amount"]);
        assert_eq!(result.rows[0]["v.price.amount"], json!("9"));
    }
}
