//! `SQLite` implementation of [`ServiceConfigRepository`].
//!
//! Each service keeps one row holding its settings as JSON.

use sqlx::SqlitePool;

use routerdesk_app::ports::ServiceConfigRepository;
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

use crate::error::StorageError;

const UPSERT: &str = r"
    INSERT INTO service_configs (kind, settings, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT (kind) DO UPDATE
    SET settings = excluded.settings, updated_at = excluded.updated_at
";

const SELECT_BY_KIND: &str = "SELECT settings FROM service_configs WHERE kind = ?";
const DELETE_BY_KIND: &str = "DELETE FROM service_configs WHERE kind = ?";

/// `SQLite`-backed service settings repository.
#[derive(Clone)]
pub struct SqliteServiceConfigRepository {
    pool: SqlitePool,
}

impl SqliteServiceConfigRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ServiceConfigRepository for SqliteServiceConfigRepository {
    async fn get(&self, kind: ServiceKind) -> Result<Option<ServiceSettings>, RouterDeskError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_BY_KIND)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let Some((json,)) = row else {
            return Ok(None);
        };
        let settings = serde_json::from_str(&json).map_err(StorageError::from)?;
        Ok(Some(settings))
    }

    async fn put(&self, settings: ServiceSettings) -> Result<ServiceSettings, RouterDeskError> {
        let json = serde_json::to_string(&settings).map_err(StorageError::from)?;
        sqlx::query(UPSERT)
            .bind(settings.kind().as_str())
            .bind(json)
            .bind(routerdesk_domain::time::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(settings)
    }

    async fn delete(&self, kind: ServiceKind) -> Result<(), RouterDeskError> {
        sqlx::query(DELETE_BY_KIND)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
