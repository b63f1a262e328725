//! Request/response types for the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{render_cell, Table};
use crate::session::{CollectionInfo, Session};

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /api/fetch`.
#[derive(Debug, Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

/// Body of `POST /api/select`.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub label: String,
}

/// Body of `POST /api/explode` and `POST /api/extract`.
#[derive(Debug, Deserialize)]
pub struct ColumnRequest {
    pub column: String,
}

/// Query string of `GET /api/table`.
#[derive(Debug, Deserialize, Default)]
pub struct TableQuery {
    /// Substring to search for; omitted means no filtering.
    pub query: Option<String>,
    /// Restrict the search to one column.
    pub column: Option<String>,
    /// Cap on returned rows (default 100).
    pub limit: Option<usize>,
}

/// Body of `POST /api/export`.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub columns: Vec<String>,
    /// Export the filtered view instead of the full table.
    pub query: Option<String>,
    pub search_column: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Result of analyzing an uploaded or fetched document.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub source: String,
    pub collections: Vec<CollectionInfo>,
}

/// A rendered slice of the working table plus session status.
#[derive(Debug, Serialize)]
pub struct TableResponse {
    pub columns: Vec<String>,
    /// Columns still holding nested records/lists (operator candidates).
    pub object_columns: Vec<String>,
    /// Suggested export columns.
    pub suggested_columns: Vec<String>,
    pub total_rows: usize,
    pub shown_rows: usize,
    /// Cells rendered to text, row-major, in `columns` order.
    pub rows: Vec<Vec<String>>,
    pub history_len: usize,
    pub can_undo: bool,
}

impl TableResponse {
    /// Render `view` (a filtered or full table) for transport, with
    /// session status taken from `session`.
    pub fn render(session: &Session, view: &Table, limit: usize) -> Self {
        let shown = view.rows.iter().take(limit);
        let rows: Vec<Vec<String>> = shown
            .map(|row| {
                view.columns
                    .iter()
                    .map(|col| render_cell(row.get(col.as_str())))
                    .collect()
            })
            .collect();

        Self {
            columns: view.columns.clone(),
            object_columns: view.object_columns(),
            suggested_columns: crate::export::suggest_columns(&view.columns),
            total_rows: view.row_count(),
            shown_rows: rows.len(),
            rows,
            history_len: session.history_len(),
            can_undo: session.can_undo(),
        }
    }
}

/// Uniform error envelope.
pub fn error_response(message: &str) -> Value {
    json!({
        "success": false,
        "error": message,
    })
}
