//! Column deduplication: keep the rightmost occurrence of each label.

use crate::models::Table;

/// Collapse duplicate column labels, keeping the rightmost occurrence of
/// each label at its rightmost position.
///
/// Rows are maps, so a duplicated label can only carry one value per row
/// (the last one written); this fixes up the label list to match.
/// Idempotent.
pub fn clean_duplicate_columns(mut table: Table) -> Table {
    let mut kept: Vec<String> = Vec::with_capacity(table.columns.len());
    for label in table.columns.iter().rev() {
        if !kept.iter().any(|k| k == label) {
            kept.push(label.clone());
        }
    }
    kept.reverse();
    table.columns = kept;
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn table_with_columns(columns: &[&str]) -> Table {
        let mut row = Map::new();
        for (i, c) in columns.iter().enumerate() {
            row.insert(c.to_string(), json!(format!("v{}", i)));
        }
        Table::new(columns.iter().map(|c| c.to_string()).collect(), vec![row])
    }

    #[test]
    fn test_rightmost_occurrence_kept() {
        let table = table_with_columns(&["a", "b", "a", "c"]);
        let cleaned = clean_duplicate_columns(table);
        assert_eq!(cleaned.columns, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_idempotent() {
        let table = table_with_columns(&["x", "y", "x", "y", "z"]);
        let once = clean_duplicate_columns(table);
        let twice = clean_duplicate_columns(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_duplicates_untouched() {
        let table = table_with_columns(&["a", "b", "c"]);
        let cleaned = clean_duplicate_columns(table.clone());
        assert_eq!(cleaned.columns, table.columns);
    }

    #[test]
    fn test_row_value_is_last_written() {
        // The map row already holds the winning value for a duplicated label.
        let mut row = Map::new();
        row.insert("a".to_string(), Value::String("first".into()));
        row.insert("a".to_string(), Value::String("second".into()));
        let table = Table::new(vec!["a".into(), "a".into()], vec![row]);

        let cleaned = clean_duplicate_columns(table);
        assert_eq!(cleaned.columns, vec!["a"]);
        assert_eq!(cleaned.rows[0]["a"], json!("second"));
    }
}
