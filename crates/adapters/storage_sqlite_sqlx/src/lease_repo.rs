//! `SQLite` implementation of [`LeaseRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use routerdesk_app::ports::LeaseRepository;
use routerdesk_domain::dhcp::Lease;
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::ServerName;

use crate::error::{StorageError, decode};

struct Wrapper(Lease);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let ip_address: String = row.try_get("ip_address")?;
        let mac_address: String = row.try_get("mac_address")?;
        let expiration: String = row.try_get("expiration")?;
        let pool: String = row.try_get("pool")?;

        let expiration = chrono::DateTime::parse_from_rfc3339(&expiration)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(Lease {
            ip_address: decode(&ip_address)?,
            mac_address: decode(&mac_address)?,
            expiration,
            pool: decode::<ServerName>(&pool)?,
            hostname: row.try_get("hostname")?,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO leases (pool, ip_address, mac_address, expiration, hostname)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT (pool, ip_address) DO UPDATE
    SET mac_address = excluded.mac_address,
        expiration = excluded.expiration,
        hostname = excluded.hostname
";

const SELECT_BY_POOL: &str = "SELECT * FROM leases WHERE pool = ?";
const DELETE_BY_POOL: &str = "DELETE FROM leases WHERE pool = ?";

/// `SQLite`-backed lease repository.
#[derive(Clone)]
pub struct SqliteLeaseRepository {
    pool: SqlitePool,
}

impl SqliteLeaseRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl LeaseRepository for SqliteLeaseRepository {
    async fn upsert(&self, lease: Lease) -> Result<Lease, RouterDeskError> {
        sqlx::query(UPSERT)
            .bind(lease.pool.as_str())
            .bind(lease.ip_address.to_string())
            .bind(lease.mac_address.to_string())
            .bind(lease.expiration.to_rfc3339())
            .bind(lease.hostname.as_deref())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(lease)
    }

    async fn find_by_server(&self, server: &ServerName) -> Result<Vec<Lease>, RouterDeskError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_POOL)
            .bind(server.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        // addresses are stored as text, so order numerically here
        let mut leases: Vec<Lease> = rows.into_iter().map(|w| w.0).collect();
        leases.sort_by_key(|lease| lease.ip_address);
        Ok(leases)
    }

    async fn delete_by_server(&self, server: &ServerName) -> Result<(), RouterDeskError> {
        sqlx::query(DELETE_BY_POOL)
            .bind(server.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
