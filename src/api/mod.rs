//! HTTP API: REST surface over a session plus the progress-log stream.

pub mod logs;
pub mod server;
pub mod types;
