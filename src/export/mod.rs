//! Spreadsheet export: render cells to text and serialize to CSV.
//!
//! Everything exports as text; numeric fidelity is explicitly not
//! preserved. The artifact is built in memory so the session can cache
//! it until the table changes.

use crate::error::{ExportError, ExportResult};
use crate::models::{render_cell, Table};

/// Substrings that mark a column as interesting for a catalog export,
/// used to preselect columns (Czech feeds mix English and Czech tags).
const PRESELECT_KEYWORDS: &[&str] = &[
    "EAN", "NAME", "NAZEV", "PRICE", "CENA", "STOCK", "QTY", "CODE", "KOD", "SIZE", "VELIKOST",
    "IMG", "URL", "MODEL", "VAT", "DPH",
];

/// Suggest an export column subset: alphabetically sorted labels whose
/// upper-cased form contains one of the catalog keywords.
pub fn suggest_columns(columns: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = columns.to_vec();
    sorted.sort();
    sorted
        .into_iter()
        .filter(|col| {
            let upper = col.to_uppercase();
            PRESELECT_KEYWORDS.iter().any(|k| upper.contains(k))
        })
        .collect()
}

/// Serialize the chosen columns of a table to an in-memory CSV artifact.
///
/// Every cell goes through [`render_cell`]: empty cells become empty
/// fields, nested leftovers collapse to compact JSON text.
pub fn to_csv(table: &Table, columns: &[String]) -> ExportResult<Vec<u8>> {
    if columns.is_empty() {
        return Err(ExportError::NoColumns);
    }
    for column in columns {
        if !table.has_column(column) {
            return Err(ExportError::UnknownColumn(column.clone()));
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;

    for row in &table.rows {
        let record: Vec<String> = columns
            .iter()
            .map(|col| render_cell(row.get(col.as_str())))
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(std::io::Error::other(e.to_string())))
}
