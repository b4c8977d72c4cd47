use super::types::RawSuggestion;
use crate::models::{DoctorRecord, Priority};

/// Doctors returned when the oracle cannot be used.
pub const FALLBACK_LIMIT: usize = 3;

pub const FALLBACK_REASON: &str = "Recommended based on specialization and experience";

const FALLBACK_TOP_SCORE: f64 = 80.0;
const FALLBACK_SCORE_STEP: f64 = 10.0;

/// Deterministic ranking used when the oracle errors or its reply is unusable.
///
/// Takes the first doctors in store order. Scores descend from 80 in steps
/// of 10; the first entry is High priority, the rest Medium.
pub fn fallback_rank(doctors: &[DoctorRecord]) -> Vec<RawSuggestion> {
    doctors
        .iter()
        .take(FALLBACK_LIMIT)
        .enumerate()
        .map(|(index, _)| RawSuggestion {
            doctor_index: index as i64,
            match_score: FALLBACK_TOP_SCORE - FALLBACK_SCORE_STEP * index as f64,
            reason: FALLBACK_REASON.to_string(),
            priority: Some(
                if index == 0 {
                    Priority::High
                } else {
                    Priority::Medium
                }
                .as_str()
                .to_string(),
            ),
        })
        .collect()
}
