//! # xmlmaster - XML catalog flattening
//!
//! xmlmaster turns arbitrarily nested XML catalog exports (product feeds,
//! price lists) into flat tables ready for spreadsheet use.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐    ┌────────────┐    ┌─────────────┐    ┌───────────┐
//! │ XML / ZIP │───▶│  Decode +  │───▶│  Collector  │───▶│  Flatten  │
//! │ file, URL │    │   Parse    │    │ (find lists)│    │  + edit   │
//! └───────────┘    └────────────┘    └─────────────┘    └───────────┘
//!                                                             │
//!                                 explode / extract / undo ◀──┤
//!                                                             ▼
//!                                                       ┌───────────┐
//!                                                       │  CSV out  │
//!                                                       └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use xmlmaster::Session;
//!
//! let xml = b"<shop><product><ean>859</ean></product>\
//!             <product><ean>860</ean></product></shop>";
//!
//! let mut session = Session::new();
//! session.analyze(xml, "feed.xml").unwrap();
//!
//! let label = session.collections()[0].label.clone();
//! session.select(&label).unwrap();
//! assert_eq!(session.table().unwrap().row_count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Per-stage error types
//! - [`models`] - Table and cell representation
//! - [`acquire`] - URL download and ZIP unwrapping
//! - [`parser`] - Charset-ladder decoding and XML import
//! - [`transform`] - Collection discovery and the structural operators
//! - [`session`] - Session state, history, export cache
//! - [`filter`] - Search view over the table
//! - [`export`] - CSV artifact rendering
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Input
pub mod acquire;
pub mod parser;

// Transformation
pub mod transform;

// Session state
pub mod session;

// Views & output
pub mod export;
pub mod filter;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AcquireError, DecodeError, ExportError, PipelineError, PipelineResult, ServerError,
    TransformError, XmlError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{is_nested, render_cell, Table};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{decode_text, parse_xml, TEXT_KEY};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    clean_duplicate_columns, explode, extract_urls, find_lists, flatten_records, sorted_labels,
};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{history::History, history::HISTORY_CAPACITY, CollectionInfo, Session};

// =============================================================================
// Re-exports - Views & output
// =============================================================================

pub use export::{suggest_columns, to_csv};
pub use filter::filter_table;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
