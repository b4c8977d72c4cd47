//! Request lifecycle for one consumer (one portal user).
//!
//! State is a single tagged value published through a `watch` channel.
//! Every trigger bumps the generation; a finishing run only publishes its
//! result if its generation is still current, so the most recently
//! triggered run is the only one ever reflected in state.
//!
//! Runs publish from their own task, so a caller that stops waiting (a
//! dropped HTTP request, a timeout) never leaves the state stuck in
//! `Running`.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use super::orchestrator::RecommendationPipeline;
use super::prompt::normalize_conditions;
use super::types::RecommendationOutcome;
use super::RecommendationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    Configuration,
    Upstream,
    Database,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&RecommendationError> for RequestFailure {
    fn from(err: &RecommendationError) -> Self {
        let kind = match err {
            RecommendationError::InvalidInput(_) => FailureKind::InvalidInput,
            RecommendationError::Configuration(_) => FailureKind::Configuration,
            RecommendationError::Upstream { .. } => FailureKind::Upstream,
            RecommendationError::Database(_) => FailureKind::Database,
            RecommendationError::Internal(_) => FailureKind::Internal,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    Running,
    Succeeded(RecommendationOutcome),
    Failed(RequestFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    /// Number of triggers so far; 0 while idle.
    pub generation: u64,
    #[serde(flatten)]
    pub state: RequestState,
}

pub struct RecommendationRequester {
    pipeline: RecommendationPipeline,
    state: Arc<watch::Sender<RequestSnapshot>>,
}

impl RecommendationRequester {
    pub fn new(pipeline: RecommendationPipeline) -> Self {
        let (state, _) = watch::channel(RequestSnapshot {
            generation: 0,
            state: RequestState::Idle,
        });
        Self {
            pipeline,
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestSnapshot> {
        self.state.subscribe()
    }

    /// Start a run, superseding any run still in flight.
    ///
    /// The caller always receives its own run's result, even if a later
    /// trigger means that result never reaches the published state.
    pub async fn trigger(
        &self,
        conditions: Vec<String>,
        is_rare_case: bool,
    ) -> Result<RecommendationOutcome, RecommendationError> {
        let generation = self.begin();

        // Rejected before any blocking work is scheduled.
        let conditions = match normalize_conditions(&conditions) {
            Ok(conditions) => conditions,
            Err(e) => {
                publish(&self.state, generation, Err(&e));
                return Err(e);
            }
        };

        let pipeline = self.pipeline.clone();
        let state = Arc::clone(&self.state);
        let run = tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || pipeline.run(&conditions, is_rare_case))
                    .await
                    .unwrap_or_else(|e| Err(task_failed(e)));
            publish(&state, generation, result.as_ref());
            result
        });

        run.await.unwrap_or_else(|e| Err(task_failed(e)))
    }

    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.state = RequestState::Running;
            generation = snapshot.generation;
        });
        generation
    }
}

fn task_failed(err: tokio::task::JoinError) -> RecommendationError {
    RecommendationError::Internal(format!("recommendation task failed: {err}"))
}

fn publish(
    state: &watch::Sender<RequestSnapshot>,
    generation: u64,
    result: Result<&RecommendationOutcome, &RecommendationError>,
) {
    let published = state.send_if_modified(|snapshot| {
        if snapshot.generation != generation {
            return false;
        }
        snapshot.state = match result {
            Ok(outcome) => RequestState::Succeeded(outcome.clone()),
            Err(e) => RequestState::Failed(RequestFailure::from(e)),
        };
        true
    });

    if !published {
        tracing::debug!(generation, "Discarding superseded recommendation result");
    }
}
