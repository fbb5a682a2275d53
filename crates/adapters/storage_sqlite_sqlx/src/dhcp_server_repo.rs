//! `SQLite` implementation of [`DhcpServerRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use routerdesk_app::ports::DhcpServerRepository;
use routerdesk_domain::dhcp::DhcpServer;
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::ServerName;

use crate::error::{StorageError, decode, decode_optional, write_error};

/// Wrapper for converting database rows into domain [`DhcpServer`].
struct Wrapper(DhcpServer);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<DhcpServer> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let name: String = row.try_get("name")?;
        let subnet: String = row.try_get("subnet")?;
        let lease_seconds: i64 = row.try_get("lease_seconds")?;

        Ok(Self(DhcpServer {
            name: decode::<ServerName>(&name)?,
            subnet: decode(&subnet)?,
            range_start: decode_optional(row.try_get("range_start")?)?,
            range_stop: decode_optional(row.try_get("range_stop")?)?,
            router: decode_optional(row.try_get("router")?)?,
            dns1: decode_optional(row.try_get("dns1")?)?,
            dns2: decode_optional(row.try_get("dns2")?)?,
            unifi_controller: decode_optional(row.try_get("unifi_controller")?)?,
            domain: row.try_get("domain")?,
            lease_seconds: u32::try_from(lease_seconds)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            enabled: row.try_get("enabled")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO dhcp_servers (name, subnet, range_start, range_stop, router, dns1, dns2,
        unifi_controller, domain, lease_seconds, enabled)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_NAME: &str = "SELECT * FROM dhcp_servers WHERE name = ?";
const SELECT_ALL: &str = "SELECT * FROM dhcp_servers ORDER BY name";

const UPDATE: &str = r"
    UPDATE dhcp_servers
    SET subnet = ?, range_start = ?, range_stop = ?, router = ?, dns1 = ?, dns2 = ?,
        unifi_controller = ?, domain = ?, lease_seconds = ?, enabled = ?
    WHERE name = ?
";

const DELETE_MAPPINGS: &str = "DELETE FROM static_mappings WHERE server = ?";
const DELETE_LEASES: &str = "DELETE FROM leases WHERE pool = ?";
const DELETE_BY_NAME: &str = "DELETE FROM dhcp_servers WHERE name = ?";

const ENTITY: &str = "DhcpServer";

fn unique_columns(server: &DhcpServer) -> [(&'static str, String); 2] {
    [
        ("name", server.name.to_string()),
        ("subnet", server.subnet.to_string()),
    ]
}

fn text<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// `SQLite`-backed DHCP server repository.
#[derive(Clone)]
pub struct SqliteDhcpServerRepository {
    pool: SqlitePool,
}

impl SqliteDhcpServerRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DhcpServerRepository for SqliteDhcpServerRepository {
    async fn create(&self, server: DhcpServer) -> Result<DhcpServer, RouterDeskError> {
        sqlx::query(INSERT)
            .bind(server.name.as_str())
            .bind(server.subnet.to_string())
            .bind(text(server.range_start))
            .bind(text(server.range_stop))
            .bind(text(server.router))
            .bind(text(server.dns1))
            .bind(text(server.dns2))
            .bind(text(server.unifi_controller))
            .bind(server.domain.as_deref())
            .bind(i64::from(server.lease_seconds))
            .bind(server.enabled)
            .execute(&self.pool)
            .await
            .map_err(|err| write_error(err, ENTITY, &unique_columns(&server)))?;

        Ok(server)
    }

    async fn get_by_name(&self, name: &ServerName) -> Result<Option<DhcpServer>, RouterDeskError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NAME)
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<DhcpServer>, RouterDeskError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, server: DhcpServer) -> Result<DhcpServer, RouterDeskError> {
        sqlx::query(UPDATE)
            .bind(server.subnet.to_string())
            .bind(text(server.range_start))
            .bind(text(server.range_stop))
            .bind(text(server.router))
            .bind(text(server.dns1))
            .bind(text(server.dns2))
            .bind(text(server.unifi_controller))
            .bind(server.domain.as_deref())
            .bind(i64::from(server.lease_seconds))
            .bind(server.enabled)
            .bind(server.name.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| write_error(err, ENTITY, &unique_columns(&server)))?;

        Ok(server)
    }

    /// Removes the server row with its mappings and leases in one transaction.
    async fn delete(&self, name: &ServerName) -> Result<(), RouterDeskError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        for statement in [DELETE_MAPPINGS, DELETE_LEASES, DELETE_BY_NAME] {
            sqlx::query(statement)
                .bind(name.as_str())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;

        Ok(())
    }
}
