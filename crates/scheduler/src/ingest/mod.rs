//! Push payload ingestion
//!
//! This module provides:
//! - [`PushPayload`] - the JSON shape the host delivers
//! - [`parse_deadline`] - `lastDate` to epoch milliseconds
//! - [`IngestHandler`] - persist the deadline, show the arrival notification

mod deadline;
mod handler;
mod payload;

pub use deadline::parse_deadline;
pub use handler::{IngestHandler, IngestOutcome};
pub use payload::PushPayload;

/// Ingest errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Payload is not a JSON object of the expected shape
    #[error("invalid payload: {0}")]
    PayloadInvalid(String),

    /// `lastDate` is missing or not a recognizable date
    #[error("unparseable deadline: {0}")]
    InvalidDeadline(String),
}
