//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table group; everything public is re-exported here.

mod doctor;
mod patient;
mod profile;
mod session;

use uuid::Uuid;

use super::DatabaseError;

pub use doctor::*;
pub use patient::*;
pub use profile::*;
pub use session::*;

/// Parse a TEXT uuid column, naming the column on failure.
pub(crate) fn parse_uuid_column(column: &str, raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::CorruptColumn {
        column: column.into(),
        reason: e.to_string(),
    })
}

/// Decode a JSON string-array column. NULL is an empty list.
pub(crate) fn parse_string_list(column: &str, raw: Option<String>) -> Result<Vec<String>, DatabaseError> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(&text).map_err(|e| DatabaseError::CorruptColumn {
            column: column.into(),
            reason: e.to_string(),
        }),
    }
}

/// Encode a string list for storage in a TEXT column.
pub(crate) fn encode_string_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
