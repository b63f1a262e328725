//! Session state: the one context object every operation flows through.
//!
//! A session owns the discovered collections of the current document, the
//! live working table, the undo history and the cached export artifact.
//! Operators snapshot the table before mutating it and invalidate the
//! export cache afterwards; nothing outside this module mutates any of it.

pub mod history;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::acquire;
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, TransformError};
use crate::export;
use crate::filter;
use crate::models::Table;
use crate::parser;
use crate::transform;

use history::History;

/// One discovered repeating collection, for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    /// Path label, e.g. `"shop > products > product (items: 120)"`.
    pub label: String,
    /// Number of elements in the collection.
    pub count: usize,
}

/// Mutable per-session state.
///
/// Single-threaded by contract: operators run to completion before the
/// next input is accepted, and each either replaces the table or leaves
/// it untouched.
#[derive(Debug, Default)]
pub struct Session {
    source_name: String,
    found_lists: Map<String, Value>,
    table: Option<Table>,
    history: History,
    export_cache: Option<Vec<u8>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Document intake
    // =========================================================================

    /// Analyze a raw document: unwrap a ZIP payload if present, decode,
    /// parse, and discover the repeating collections.
    ///
    /// Replaces any previous document; table, history and export cache are
    /// torn down. Returns the number of discovered collections.
    pub fn analyze(&mut self, raw: &[u8], source_name: &str) -> PipelineResult<usize> {
        let bytes: Vec<u8> = if acquire::is_zip(raw) {
            log_info("Unpacking ZIP archive...");
            match acquire::unwrap_archive(raw) {
                Ok(inner) => inner,
                Err(e) => {
                    // Mis-detected or broken archive: fall back to the raw
                    // payload and let the decoder have a go.
                    log_warning(format!("Archive unwrap failed ({}), using raw bytes", e));
                    raw.to_vec()
                }
            }
        } else {
            raw.to_vec()
        };

        log_info("Decoding text...");
        let text = parser::decode_text(&bytes)?;

        log_info("Parsing XML...");
        let root = parser::parse_xml(&text)?;

        let found = transform::find_lists(&root);
        if found.is_empty() {
            return Err(PipelineError::NoCollections);
        }
        log_success(format!("Found {} repeating collections", found.len()));

        self.found_lists = found;
        self.source_name = source_name.to_string();
        self.table = None;
        self.history.clear();
        self.export_cache = None;
        Ok(self.found_lists.len())
    }

    /// Source label of the current document (upload name or URL).
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Discovered collections sorted by descending item count.
    pub fn collections(&self) -> Vec<CollectionInfo> {
        transform::sorted_labels(&self.found_lists)
            .into_iter()
            .map(|label| {
                let count = self
                    .found_lists
                    .get(&label)
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);
                CollectionInfo { label, count }
            })
            .collect()
    }

    /// Load a discovered collection as the working table.
    ///
    /// A previously loaded table is pushed to history first, so the
    /// selection itself is undoable.
    pub fn select(&mut self, label: &str) -> PipelineResult<()> {
        let items = self
            .found_lists
            .get(label)
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| TransformError::UnknownCollection(label.to_string()))?;

        if let Some(current) = self.table.take() {
            self.history.push(current);
        }

        let table = transform::flatten_records(&items);
        log_success(format!(
            "Loaded {} rows x {} columns",
            table.row_count(),
            table.columns.len()
        ));
        self.table = Some(table);
        self.export_cache = None;
        Ok(())
    }

    // =========================================================================
    // Table access
    // =========================================================================

    /// The live working table, if one is loaded.
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Case-insensitive substring search over one or all columns.
    ///
    /// Purely a view: never pushes history, never mutates the table.
    pub fn search(&self, column: Option<&str>, query: &str) -> PipelineResult<Table> {
        let table = self.table.as_ref().ok_or(TransformError::NoTable)?;
        Ok(filter::filter_table(table, column, query)?)
    }

    // =========================================================================
    // Structural operators
    // =========================================================================

    /// Explode a nested-collection column into extra rows.
    pub fn explode(&mut self, column: &str) -> PipelineResult<()> {
        self.apply_operator(column, transform::explode)
    }

    /// Decompose a column into numbered URL columns.
    pub fn extract_urls(&mut self, column: &str) -> PipelineResult<()> {
        self.apply_operator(column, transform::extract_urls)
    }

    /// Snapshot, run an operator, commit or roll the snapshot back.
    ///
    /// The operators are pure, so on failure the table is untouched and
    /// the just-pushed snapshot would only waste an undo slot; popping it
    /// again keeps the stack clean.
    fn apply_operator<F>(&mut self, column: &str, op: F) -> PipelineResult<()>
    where
        F: Fn(&Table, &str) -> Result<Table, TransformError>,
    {
        let current = self.table.as_ref().ok_or(TransformError::NoTable)?;
        self.history.push(current.clone());

        match op(current, column) {
            Ok(next) => {
                self.table = Some(next);
                self.export_cache = None;
                Ok(())
            }
            Err(e) => {
                self.history.discard_last();
                Err(e.into())
            }
        }
    }

    /// Restore the most recent snapshot; no-op when history is empty.
    ///
    /// Returns whether a step was undone.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.table = Some(previous);
                self.export_cache = None;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Build the spreadsheet artifact for the chosen columns, over either
    /// the supplied filtered view or the full table, and cache it.
    ///
    /// On failure the previously cached artifact is left untouched.
    pub fn export(&mut self, columns: &[String], view: Option<&Table>) -> PipelineResult<Vec<u8>> {
        let table = match view {
            Some(v) => v,
            None => self.table.as_ref().ok_or(TransformError::NoTable)?,
        };

        let artifact = export::to_csv(table, columns)?;
        self.export_cache = Some(artifact.clone());
        Ok(artifact)
    }

    /// The cached artifact from the last successful export, if the table
    /// has not changed since.
    pub fn cached_artifact(&self) -> Option<&[u8]> {
        self.export_cache.as_deref()
    }

    /// Tear the session down to its initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FEED: &str = "<shop><products>\
        <product><code>A1</code><variants>\
            <variant><size>M</size><qty>2</qty></variant>\
            <variant><size>L</size><qty>1</qty></variant>\
        </variants></product>\
        <product><code>B2</code></product>\
        </products></shop>";

    fn loaded_session() -> Session {
        let mut session = Session::new();
        session.analyze(FEED.as_bytes(), "feed.xml").unwrap();
        let label = session.collections()[0].label.clone();
        session.select(&label).unwrap();
        session
    }

    #[test]
    fn test_analyze_and_select() {
        let session = loaded_session();
        let table = session.table().unwrap();

        assert_eq!(table.row_count(), 2);
        assert!(table.has_column("code"));
        assert!(table.has_column("variants.variant"));
    }

    #[test]
    fn test_explode_then_undo_restores_table() {
        let mut session = loaded_session();
        let before = session.table().unwrap().clone();

        session.explode("variants.variant").unwrap();
        let after = session.table().unwrap();
        assert_eq!(after.row_count(), 3); // 2 variants + 1 sentinel row
        assert!(after.has_column("variants.variant.size"));

        assert!(session.undo());
        assert_eq!(session.table().unwrap(), &before);
    }

    #[test]
    fn test_failed_operator_rolls_back_snapshot() {
        let mut session = loaded_session();
        let history_before = session.history_len();

        let err = session.explode("no-such-column").unwrap_err();
        assert!(err.to_string().contains("no-such-column"));

        assert_eq!(session.history_len(), history_before);
        assert_eq!(session.table().unwrap().row_count(), 2);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut session = Session::new();
        assert!(!session.undo());
        assert!(session.table().is_none());
    }

    #[test]
    fn test_export_cache_invalidated_by_operators() {
        let mut session = loaded_session();

        let columns = vec!["code".to_string()];
        session.export(&columns, None).unwrap();
        assert!(session.cached_artifact().is_some());

        session.explode("variants.variant").unwrap();
        assert!(session.cached_artifact().is_none());

        session.export(&columns, None).unwrap();
        assert!(session.cached_artifact().is_some());
        assert!(session.undo());
        assert!(session.cached_artifact().is_none());
    }

    #[test]
    fn test_failed_export_keeps_cache() {
        let mut session = loaded_session();
        session.export(&["code".to_string()], None).unwrap();

        let err = session.export(&[], None);
        assert!(err.is_err());
        assert!(session.cached_artifact().is_some());
    }

    #[test]
    fn test_search_is_a_pure_view() {
        let mut session = loaded_session();
        let history_before = session.history_len();

        let view = session.search(Some("code"), "a1").unwrap();
        assert_eq!(view.row_count(), 1);
        assert_eq!(view.rows[0]["code"], json!("A1"));

        assert_eq!(session.history_len(), history_before);
        assert_eq!(session.table().unwrap().row_count(), 2);
    }

    #[test]
    fn test_selection_is_undoable() {
        let mut session = Session::new();
        session.analyze(FEED.as_bytes(), "feed.xml").unwrap();

        let label = session.collections()[0].label.clone();
        session.select(&label).unwrap();
        let first = session.table().unwrap().clone();

        session.select(&label).unwrap();
        assert_eq!(session.history_len(), 1);

        assert!(session.undo());
        assert_eq!(session.table().unwrap(), &first);
    }

    #[test]
    fn test_analyze_resets_state() {
        let mut session = loaded_session();
        session.explode("variants.variant").unwrap();
        assert!(session.can_undo());

        session.analyze(FEED.as_bytes(), "again.xml").unwrap();
        assert!(session.table().is_none());
        assert!(!session.can_undo());
        assert_eq!(session.source_name(), "again.xml");
    }

    #[test]
    fn test_deep_undo_stops_at_capacity() {
        // Eight scalar columns; each explode drops one and pushes a snapshot.
        let mut xml = String::from("<shop>");
        for _ in 0..2 {
            xml.push_str("<item>");
            for c in 1..=8 {
                xml.push_str(&format!("<c{0}>v</c{0}>", c));
            }
            xml.push_str("</item>");
        }
        xml.push_str("</shop>");

        let mut session = Session::new();
        session.analyze(xml.as_bytes(), "feed.xml").unwrap();
        let label = session.collections()[0].label.clone();
        session.select(&label).unwrap();

        for c in 1..=7 {
            session.explode(&format!("c{}", c)).unwrap();
        }

        // Capacity 5: only the five most recent snapshots survive.
        assert_eq!(session.history_len(), 5);
        for _ in 0..5 {
            assert!(session.undo());
        }

        // Restored to the state right after the second operator:
        // c1 and c2 gone, c3..c8 still present.
        let table = session.table().unwrap();
        assert!(!table.has_column("c1"));
        assert!(!table.has_column("c2"));
        for c in 3..=8 {
            assert!(table.has_column(&format!("c{}", c)));
        }

        // A sixth undo is a no-op.
        assert!(!session.undo());
    }

    #[test]
    fn test_no_collections_error() {
        let mut session = Session::new();
        let err = session.analyze(b"<root><only>text</only></root>", "x.xml");
        assert!(matches!(err, Err(PipelineError::NoCollections)));
    }
}
