use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::assembler::assemble;
use super::extractor::extract_suggestions;
use super::fallback::fallback_rank;
use super::prompt::{compose_request, normalize_conditions};
use super::types::{
    DegradedReason, DoctorStore, RankingOracle, RankingQuery, RankingSource, RawSuggestion,
    RecommendationOutcome,
};
use super::RecommendationError;
use crate::db::{get_all_doctor_records, open_database, DatabaseError};
use crate::models::DoctorRecord;

const LOG_PREVIEW_CHARS: usize = 300;

/// Doctor store backed by the portal SQLite database.
///
/// Opens a connection per load; the pipeline reads the store once per run.
pub struct SqliteDoctorStore {
    db_path: PathBuf,
}

impl SqliteDoctorStore {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

impl DoctorStore for SqliteDoctorStore {
    fn load_doctors(&self) -> Result<Vec<DoctorRecord>, DatabaseError> {
        let conn = open_database(&self.db_path)?;
        get_all_doctor_records(&conn)
    }
}

/// One end-to-end recommendation run: compose, rank, extract (or fall back), assemble.
///
/// Blocking. Callers on the async runtime go through `spawn_blocking`.
#[derive(Clone)]
pub struct RecommendationPipeline {
    oracle: Arc<dyn RankingOracle>,
    store: Arc<dyn DoctorStore>,
}

impl RecommendationPipeline {
    pub fn new(oracle: Arc<dyn RankingOracle>, store: Arc<dyn DoctorStore>) -> Self {
        Self { oracle, store }
    }

    pub fn is_configured(&self) -> bool {
        self.oracle.is_configured()
    }

    pub fn store(&self) -> &Arc<dyn DoctorStore> {
        &self.store
    }

    pub fn run(
        &self,
        conditions: &[String],
        is_rare_case: bool,
    ) -> Result<RecommendationOutcome, RecommendationError> {
        let start = Instant::now();
        let conditions = normalize_conditions(conditions)?;

        if !self.oracle.is_configured() {
            tracing::error!("Ranking service credential missing; recommendations unavailable");
            return Err(RecommendationError::Configuration(
                "RANKING_API_KEY is not configured".into(),
            ));
        }

        let doctors = self.store.load_doctors()?;
        if doctors.is_empty() {
            tracing::info!("No doctors on record; skipping ranking");
            return Ok(RecommendationOutcome::no_candidates());
        }

        tracing::info!(
            condition_count = conditions.len(),
            is_rare_case,
            doctor_count = doctors.len(),
            "Ranking doctors"
        );

        let query = RankingQuery {
            conditions,
            is_rare_case,
            doctors,
        };
        let request = compose_request(&query)?;

        let (suggestions, degraded_reason) = match self.oracle.rank(&request) {
            Ok(text) => {
                tracing::debug!(
                    chars = text.len(),
                    preview = %text.chars().take(LOG_PREVIEW_CHARS).collect::<String>(),
                    "Ranking response received"
                );
                match extract_suggestions(&text) {
                    Ok(suggestions) => (suggestions, None),
                    Err(failure) => {
                        tracing::warn!(reason = %failure.reason, "Ranking response unusable, using fallback");
                        (fallback_rank(&query.doctors), Some(DegradedReason::ParseFailure))
                    }
                }
            }
            Err(e) if e.is_degradable() => {
                tracing::warn!(error = %e, "Ranking service failed, using fallback");
                (fallback_rank(&query.doctors), Some(DegradedReason::UpstreamError))
            }
            Err(e) => return Err(e),
        };

        let outcome = finish(&suggestions, &query.doctors, degraded_reason);
        tracing::info!(
            returned = outcome.recommendations.len(),
            suggested = suggestions.len(),
            source = ?outcome.source,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendations ready"
        );
        Ok(outcome)
    }
}

fn finish(
    suggestions: &[RawSuggestion],
    doctors: &[DoctorRecord],
    degraded_reason: Option<DegradedReason>,
) -> RecommendationOutcome {
    RecommendationOutcome {
        recommendations: assemble(suggestions, doctors),
        source: if degraded_reason.is_some() {
            RankingSource::Fallback
        } else {
            RankingSource::Oracle
        },
        degraded_reason,
        message: None,
    }
}
