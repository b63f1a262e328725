//! Flatten a selected collection into a table of scalar columns.
//!
//! Nested records collapse into dotted-path labels (`parent.child`);
//! list-valued fields stay behind as single object-typed cells so the
//! explode and extract operators can act on them explicitly.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::models::Table;
use crate::parser::TEXT_KEY;

use super::dedup::clean_duplicate_columns;

/// Normalize a collection of records into a flat [`Table`].
///
/// One input element becomes one row. Columns are the union of all dotted
/// paths observed across all rows, in first-seen order; keys missing from a
/// row stay empty. A bare scalar element lands in the `"#text"` column, the
/// importer's text-content convention.
pub fn flatten_records(items: &[Value]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut rows: Vec<Map<String, Value>> = Vec::with_capacity(items.len());

    for item in items {
        let mut row = Map::new();
        match item {
            Value::Object(_) => flatten_value("", item, &mut row),
            Value::Null => {}
            other => {
                row.insert(TEXT_KEY.to_string(), other.clone());
            }
        }

        for key in row.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
        rows.push(row);
    }

    clean_duplicate_columns(Table::new(columns, rows))
}

/// Recursively flatten a record into dotted-path leaves.
///
/// Lists and scalars are leaves; nested records recurse with an extended
/// prefix. An empty record contributes nothing, which is what makes the
/// explode sentinel safe.
pub(crate) fn flatten_value(prefix: &str, value: &Value, out: &mut Map<String, Value>) {
    if let Value::Object(map) = value {
        for (key, child) in map {
            let label = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match child {
                Value::Object(_) => flatten_value(&label, child, out),
                other => {
                    out.insert(label, other.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_records_become_dotted_columns() {
        let items = vec![json!({
            "code": "A1",
            "price": {"amount": "100", "currency": "CZK"}
        })];

        let table = flatten_records(&items);
        assert_eq!(
            table.columns,
            vec!["code", "price.amount", "price.currency"]
        );
        assert_eq!(table.rows[0]["price.amount"], json!("100"));
    }

    #[test]
    fn test_lists_stay_as_object_cells() {
        let items = vec![json!({
            "code": "A1",
            "variants": {"variant": [{"size": "M"}, {"size": "L"}]}
        })];

        let table = flatten_records(&items);
        assert_eq!(table.columns, vec!["code", "variants.variant"]);
        assert!(table.rows[0]["variants.variant"].is_array());
        assert_eq!(table.object_columns(), vec!["variants.variant"]);
    }

    #[test]
    fn test_missing_keys_are_empty_cells() {
        let items = vec![
            json!({"a": "1", "b": "2"}),
            json!({"a": "3", "c": "4"}),
        ];

        let table = flatten_records(&items);
        assert_eq!(table.columns, vec!["a", "b", "c"]);
        assert_eq!(table.row_count(), 2);
        assert!(table.cell(0, "c").is_none());
        assert!(table.cell(1, "b").is_none());
    }

    #[test]
    fn test_column_union_first_seen_order() {
        let items = vec![
            json!({"z": "1"}),
            json!({"a": "2", "z": "3"}),
            json!({"m": "4"}),
        ];

        let table = flatten_records(&items);
        assert_eq!(table.columns, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_scalar_elements_use_text_column() {
        let items = vec![json!("first"), json!("second")];

        let table = flatten_records(&items);
        assert_eq!(table.columns, vec![TEXT_KEY]);
        assert_eq!(table.rows[1][TEXT_KEY], json!("second"));
    }

    #[test]
    fn test_deeply_nested_paths() {
        let items = vec![json!({"a": {"b": {"c": "leaf"}}})];

        let table = flatten_records(&items);
        assert_eq!(table.columns, vec!["a.b.c"]);
        assert_eq!(table.rows[0]["a.b.c"], json!("leaf"));
    }
}
