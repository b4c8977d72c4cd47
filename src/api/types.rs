//! Shared types for the API layer.

use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::app_state::PortalState;
use crate::db::DatabaseError;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub portal: Arc<PortalState>,
}

impl ApiContext {
    pub fn new(portal: Arc<PortalState>) -> Self {
        Self { portal }
    }

    /// Run blocking store work on the blocking pool, off the async workers.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&PortalState) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let portal = Arc::clone(&self.portal);
        tokio::task::spawn_blocking(move || f(&portal))
            .await
            .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
    }

    /// `blocking` with a fresh connection to the portal database.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        self.blocking(move |portal| {
            let conn = portal.open_db()?;
            Ok(f(&conn)?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::get_all_doctor_records;

    fn context(dir: &tempfile::TempDir) -> ApiContext {
        let db_path = dir.path().join("portal.db");
        let config = AppConfig::from_lookup(|key| match key {
            "MEDPORTAL_DB_PATH" => Some(db_path.display().to_string()),
            _ => None,
        });
        ApiContext::new(Arc::new(PortalState::new(config)))
    }

    #[tokio::test]
    async fn with_db_runs_off_the_async_worker() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let worker = std::thread::current().id();

        let (doctors, thread) = ctx
            .with_db(|conn| Ok((get_all_doctor_records(conn)?, std::thread::current().id())))
            .await
            .unwrap();
        assert!(doctors.is_empty());
        assert_ne!(thread, worker);
    }

    #[tokio::test]
    async fn with_db_maps_database_errors_to_internal() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let result: Result<(), ApiError> = ctx
            .with_db(|_| Err(DatabaseError::ConstraintViolation("boom".into())))
            .await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }
}
