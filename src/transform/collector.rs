//! Recursive discovery of repeating collections in the parsed tree.
//!
//! Walks the document depth-first and records every non-empty list under a
//! human-readable path label like `"shop > products > product (items: 120)"`.
//! A recorded list's own elements are not re-scanned; sibling and ancestor
//! branches continue. Two branches computing the same label silently
//! overwrite each other, later visit wins (the label keeps the position of
//! the first insert).

use serde_json::{Map, Value};

/// Find every non-empty list in the tree, keyed by path label.
///
/// The returned map's values are always `Value::Array`.
pub fn find_lists(root: &Value) -> Map<String, Value> {
    let mut results = Map::new();
    walk(root, "", &mut results);
    results
}

fn walk(node: &Value, path: &str, results: &mut Map<String, Value>) {
    match node {
        Value::Array(items) => {
            if !items.is_empty() {
                let label = format!("{} (items: {})", path, items.len());
                results.insert(label, node.clone());
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{} > {}", path, key)
                };
                walk(value, &child_path, results);
            }
        }
        _ => {}
    }
}

/// Labels sorted by descending item count, for presentation.
pub fn sorted_labels(found: &Map<String, Value>) -> Vec<String> {
    let mut labels: Vec<(usize, String)> = found
        .iter()
        .map(|(label, value)| {
            let count = value.as_array().map(Vec::len).unwrap_or(0);
            (count, label.clone())
        })
        .collect();
    labels.sort_by(|a, b| b.0.cmp(&a.0));
    labels.into_iter().map(|(_, label)| label).collect()
}
