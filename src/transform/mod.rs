//! Table construction and the structural operators.
//!
//! Everything here is a pure function from input table(s) to a new
//! [`Table`](crate::models::Table); snapshots, history and cache
//! invalidation live in [`crate::session`].
//!
//! - [`collector`] - discover repeating collections in the parsed tree
//! - [`flatten`] - normalize a collection into a flat table
//! - [`explode`] - expand a nested-collection column into rows
//! - [`extract`] - decompose a column into numbered URL columns
//! - [`dedup`] - collapse duplicate column labels (rightmost wins)

pub mod collector;
pub mod dedup;
pub mod explode;
pub mod extract;
pub mod flatten;

pub use collector::{find_lists, sorted_labels};
pub use dedup::clean_duplicate_columns;
pub use explode::explode;
pub use extract::extract_urls;
pub use flatten::flatten_records;
