use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RecommendationError;
use crate::db::DatabaseError;
use crate::models::{DoctorRecord, Priority, Specialization};

/// One ranking invocation. Never persisted.
#[derive(Debug, Clone)]
pub struct RankingQuery {
    pub conditions: Vec<String>,
    pub is_rare_case: bool,
    /// Snapshot used for both prompt enumeration and index resolution.
    pub doctors: Vec<DoctorRecord>,
}

/// The composed request sent to the ranking oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub system: String,
    pub prompt: String,
    /// Number of doctors enumerated in `prompt` (valid indices are `0..doctor_count`).
    pub doctor_count: usize,
}

/// Index-addressed ranking entry, as reported by the oracle or the fallback.
///
/// Unvalidated: the index may be out of range, the score outside 0–100
/// and the priority arbitrary text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSuggestion {
    pub doctor_index: i64,
    pub match_score: f64,
    pub reason: String,
    pub priority: Option<String>,
}

/// Oracle text that did not contain a usable recommendation list.
///
/// A value, not an error: the pipeline answers it with the fallback ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub reason: String,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unusable ranking response: {}", self.reason)
    }
}

/// Validated, user-facing recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub specialization: Specialization,
    pub experience_years: u32,
    pub rating: f64,
    pub is_available: bool,
    pub rare_cases_handled: u32,
    /// Clamped to 0–100.
    pub match_score: u8,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub next_available: String,
}

/// Where the ranking order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSource {
    Oracle,
    Fallback,
    /// No doctors on record; the oracle was not consulted.
    NoCandidates,
}

/// Why a run answered with the fallback ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    UpstreamError,
    ParseFailure,
}

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<Recommendation>,
    pub source: RankingSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<DegradedReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecommendationOutcome {
    pub fn no_candidates() -> Self {
        Self {
            recommendations: Vec::new(),
            source: RankingSource::NoCandidates,
            degraded_reason: None,
            message: Some("No doctors available".to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded_reason.is_some()
    }
}

/// External text-ranking capability (allows mocking).
///
/// `rank` makes exactly one attempt; retries are the caller's decision.
pub trait RankingOracle: Send + Sync {
    fn rank(&self, request: &OracleRequest) -> Result<String, RecommendationError>;

    /// Whether a credential is present. Checked before any network call.
    fn is_configured(&self) -> bool;
}

/// Source of candidate doctors. All records are candidates.
pub trait DoctorStore: Send + Sync {
    fn load_doctors(&self) -> Result<Vec<DoctorRecord>, DatabaseError>;
}

impl DoctorStore for Vec<DoctorRecord> {
    fn load_doctors(&self) -> Result<Vec<DoctorRecord>, DatabaseError> {
        Ok(self.clone())
    }
}
