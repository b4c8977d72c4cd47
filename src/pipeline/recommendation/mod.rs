//! Doctor recommendation pipeline.
//!
//! ```text
//! conditions ─► prompt (compose) ─► oracle (rank) ─► extractor ─┬─► assembler ─► outcome
//!                                                   fallback ◄──┘
//! ```
//!
//! The oracle is an untrusted text producer. Everything it returns is
//! recovered in `extractor` and joined back to authoritative
//! `DoctorRecord`s in `assembler`; only indices that resolve survive.

pub mod assembler;
pub mod extractor;
pub mod fallback;
pub mod oracle;
pub mod orchestrator;
pub mod prompt;
pub mod requester;
pub mod types;

pub use assembler::*;
pub use extractor::*;
pub use fallback::*;
pub use oracle::*;
pub use orchestrator::*;
pub use prompt::*;
pub use requester::*;
pub use types::*;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum RecommendationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ranking service not configured: {0}")]
    Configuration(String),

    #[error("Ranking service error{}: {detail}", status_suffix(.status))]
    Upstream { status: Option<u16>, detail: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl RecommendationError {
    /// Errors the pipeline answers with the fallback ranking instead of failing.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}
