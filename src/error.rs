//! Error types for the xmlmaster pipeline.
//!
//! This module defines one error enum per pipeline stage:
//!
//! - [`AcquireError`] - download / archive errors
//! - [`DecodeError`] - character-set decoding errors
//! - [`XmlError`] - XML parsing errors
//! - [`TransformError`] - table operator errors
//! - [`ExportError`] - spreadsheet serialization errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. None of these are
//! fatal: every one renders as a single readable message and the
//! session stays usable afterwards.

use thiserror::Error;

// =============================================================================
// Acquisition Errors
// =============================================================================

/// Errors while acquiring raw bytes (download or archive unwrap).
#[derive(Debug, Error)]
pub enum AcquireError {
    /// HTTP request failed.
    #[error("Download failed: {0}")]
    Http(String),

    /// Server answered with a non-success status.
    #[error("Server returned status {0}")]
    Status(u16),

    /// ZIP archive could not be opened or read.
    #[error("Archive error: {0}")]
    Archive(String),

    /// ZIP archive contained no entries.
    #[error("Archive is empty")]
    EmptyArchive,

    /// Failed to read local file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors while decoding raw bytes to text.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No charset in the ladder produced a clean decode.
    #[error("No supported charset could decode the input (tried: {0})")]
    NoCharsetMatched(String),

    /// Decoded text was empty.
    #[error("Decoded document is empty")]
    EmptyDocument,
}

// =============================================================================
// XML Parsing Errors
// =============================================================================

/// Errors during XML parsing.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Malformed XML.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Document had no root element.
    #[error("Document has no root element")]
    NoRoot,

    /// Element nesting exceeded the recursion limit.
    #[error("XML nesting exceeded maximum depth of {0}")]
    TooDeep(usize),
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors from the table operators.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Target column does not exist.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Discovered-collection label does not exist.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Operator was invoked before a table was loaded.
    #[error("No table loaded")]
    NoTable,
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while building the export artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No columns selected for export.
    #[error("No columns selected for export")]
    NoColumns,

    /// A selected column does not exist in the table.
    #[error("Export column not in table: {0}")]
    UnknownColumn(String),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Buffer finalization failed.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::session::Session`]
/// entry points and the CLI. It wraps all stage errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Acquisition error.
    #[error("Acquisition error: {0}")]
    Acquire(#[from] AcquireError),

    /// Decode error.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// XML parsing error.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Document contained no repeating collections.
    #[error("No repeating collections found in document")]
    NoCollections,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for acquisition operations.
pub type AcquireResult<T> = Result<T, AcquireError>;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for XML parsing.
pub type XmlResult<T> = Result<T, XmlError>;

/// Result type for table operators.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // DecodeError -> PipelineError
        let decode_err = DecodeError::EmptyDocument;
        let pipeline_err: PipelineError = decode_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // TransformError -> PipelineError
        let transform_err = TransformError::MissingColumn("variants".into());
        let pipeline_err: PipelineError = transform_err.into();
        assert!(pipeline_err.to_string().contains("variants"));
    }

    #[test]
    fn test_xml_error_format() {
        let err = XmlError::Syntax {
            position: 42,
            message: "unexpected end tag".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("unexpected end tag"));
    }

    #[test]
    fn test_server_error_wraps_pipeline() {
        let err: ServerError = PipelineError::NoCollections.into();
        assert!(err.to_string().contains("No repeating collections"));
    }
}
