//! `SQLite` implementation of [`StaticMappingRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use routerdesk_app::ports::StaticMappingRepository;
use routerdesk_domain::dhcp::StaticMapping;
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::{MappingId, ServerName};

use crate::error::{StorageError, decode, write_error};

struct Wrapper(StaticMapping);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<StaticMapping> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let mac_address: String = row.try_get("mac_address")?;
        let ip_address: String = row.try_get("ip_address")?;

        Ok(Self(StaticMapping::new(
            decode::<MappingId>(&id)?,
            decode(&mac_address)?,
            decode(&ip_address)?,
        )))
    }
}

const ENTITY: &str = "StaticMapping";

fn unique_columns(mapping: &StaticMapping) -> [(&'static str, String); 3] {
    [
        ("id", mapping.id.to_string()),
        ("mac_address", mapping.mac_address.to_string()),
        ("ip_address", mapping.ip_address.to_string()),
    ]
}

const INSERT: &str =
    "INSERT INTO static_mappings (server, id, mac_address, ip_address) VALUES (?, ?, ?, ?)";
const SELECT_ONE: &str = "SELECT * FROM static_mappings WHERE server = ? AND id = ?";
const SELECT_BY_SERVER: &str = "SELECT * FROM static_mappings WHERE server = ? ORDER BY id";
const UPDATE: &str =
    "UPDATE static_mappings SET mac_address = ?, ip_address = ? WHERE server = ? AND id = ?";
const DELETE_ONE: &str = "DELETE FROM static_mappings WHERE server = ? AND id = ?";
const DELETE_BY_SERVER: &str = "DELETE FROM static_mappings WHERE server = ?";

/// `SQLite`-backed static mapping repository.
#[derive(Clone)]
pub struct SqliteStaticMappingRepository {
    pool: SqlitePool,
}

impl SqliteStaticMappingRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl StaticMappingRepository for SqliteStaticMappingRepository {
    async fn create(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> Result<StaticMapping, RouterDeskError> {
        sqlx::query(INSERT)
            .bind(server.as_str())
            .bind(mapping.id.as_str())
            .bind(mapping.mac_address.to_string())
            .bind(mapping.ip_address.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| write_error(err, ENTITY, &unique_columns(&mapping)))?;

        Ok(mapping)
    }

    async fn get(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> Result<Option<StaticMapping>, RouterDeskError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_ONE)
            .bind(server.as_str())
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn find_by_server(
        &self,
        server: &ServerName,
    ) -> Result<Vec<StaticMapping>, RouterDeskError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_SERVER)
            .bind(server.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> Result<StaticMapping, RouterDeskError> {
        sqlx::query(UPDATE)
            .bind(mapping.mac_address.to_string())
            .bind(mapping.ip_address.to_string())
            .bind(server.as_str())
            .bind(mapping.id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| write_error(err, ENTITY, &unique_columns(&mapping)))?;

        Ok(mapping)
    }

    async fn delete(&self, server: &ServerName, id: &MappingId) -> Result<(), RouterDeskError> {
        sqlx::query(DELETE_ONE)
            .bind(server.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn delete_by_server(&self, server: &ServerName) -> Result<(), RouterDeskError> {
        sqlx::query(DELETE_BY_SERVER)
            .bind(server.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
