//! `SQLite` implementation of [`BlockedNetworkRepository`].

use ipnetwork::Ipv4Network;
use sqlx::SqlitePool;

use routerdesk_app::ports::BlockedNetworkRepository;
use routerdesk_domain::blocklist::NetworkDiff;
use routerdesk_domain::error::RouterDeskError;

use crate::error::{StorageError, decode};

const SELECT_ALL: &str = "SELECT cidr FROM blocked_networks";
const INSERT: &str = "INSERT OR IGNORE INTO blocked_networks (cidr, added_at) VALUES (?, ?)";
const DELETE: &str = "DELETE FROM blocked_networks WHERE cidr = ?";

/// `SQLite`-backed block list, one row per CIDR block.
#[derive(Clone)]
pub struct SqliteBlockedNetworkRepository {
    pool: SqlitePool,
}

impl SqliteBlockedNetworkRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BlockedNetworkRepository for SqliteBlockedNetworkRepository {
    async fn get_all(&self) -> Result<Vec<Ipv4Network>, RouterDeskError> {
        let rows: Vec<(String,)> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let mut networks = rows
            .iter()
            .map(|(cidr,)| decode::<Ipv4Network>(cidr))
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;
        networks.sort_unstable();
        Ok(networks)
    }

    async fn apply(&self, diff: &NetworkDiff) -> Result<(), RouterDeskError> {
        let added_at = routerdesk_domain::time::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        for network in &diff.deleted {
            sqlx::query(DELETE)
                .bind(network.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        for network in &diff.added {
            sqlx::query(INSERT)
                .bind(network.to_string())
                .bind(added_at.as_str())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}
