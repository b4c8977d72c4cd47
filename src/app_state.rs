//! Shared state for the HTTP layer.
//!
//! One `PortalState` per process, wrapped in `Arc` at startup. Each
//! authenticated user gets their own `RecommendationRequester`, so a
//! new request from one user supersedes only that user's in-flight run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::pipeline::recommendation::{
    GatewayRankingClient, RecommendationPipeline, RecommendationRequester, SqliteDoctorStore,
};

pub struct PortalState {
    config: AppConfig,
    pipeline: RecommendationPipeline,
    requesters: Mutex<HashMap<Uuid, Arc<RecommendationRequester>>>,
}

impl PortalState {
    /// Production wiring: gateway oracle + SQLite doctor store at `config.db_path`.
    pub fn new(config: AppConfig) -> Self {
        let pipeline = RecommendationPipeline::new(
            Arc::new(GatewayRankingClient::new(config.ranking.clone())),
            Arc::new(SqliteDoctorStore::new(config.db_path.clone())),
        );
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_pipeline(config: AppConfig, pipeline: RecommendationPipeline) -> Self {
        Self {
            config,
            pipeline,
            requesters: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &RecommendationPipeline {
        &self.pipeline
    }

    /// Open a connection to the portal database.
    pub fn open_db(&self) -> Result<rusqlite::Connection, PortalError> {
        db::open_database(&self.config.db_path).map_err(PortalError::Database)
    }

    /// The requester owned by `user_id`, created on first use.
    pub fn requester_for(&self, user_id: &Uuid) -> Result<Arc<RecommendationRequester>, PortalError> {
        let mut requesters = self.requesters.lock().map_err(|_| PortalError::LockPoisoned)?;
        let requester = requesters
            .entry(*user_id)
            .or_insert_with(|| Arc::new(RecommendationRequester::new(self.pipeline.clone())));
        Ok(Arc::clone(requester))
    }

    /// The requester for `user_id` if one exists; never creates.
    pub fn existing_requester(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<Arc<RecommendationRequester>>, PortalError> {
        let requesters = self.requesters.lock().map_err(|_| PortalError::LockPoisoned)?;
        Ok(requesters.get(user_id).cloned())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
