//! Lease service: leases observed by the DHCP daemon.

use routerdesk_domain::dhcp::Lease;
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::ServerName;

use super::require_server;
use crate::ports::{DhcpServerRepository, LeaseRepository};

/// Application service for querying and recording leases.
pub struct LeaseService<SR, LR> {
    servers: SR,
    leases: LR,
}

impl<SR, LR> LeaseService<SR, LR>
where
    SR: DhcpServerRepository,
    LR: LeaseRepository,
{
    /// Create a new service backed by the given repositories.
    pub fn new(servers: SR, leases: LR) -> Self {
        Self { servers, leases }
    }

    /// Leases of `server`, ordered by address.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] for an unknown server, or a
    /// storage error from the repositories.
    pub async fn list_leases(&self, server: &ServerName) -> Result<Vec<Lease>, RouterDeskError> {
        require_server(&self.servers, server).await?;
        let mut leases = self.leases.find_by_server(server).await?;
        leases.sort_by_key(|lease| lease.ip_address);
        Ok(leases)
    }

    /// Record a lease handed out by the daemon, replacing the previous lease
    /// of the same address.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] when the pool is unknown,
    /// [`RouterDeskError::Validation`] when the address is outside the pool
    /// subnet, or a storage error from the repositories.
    pub async fn record_lease(&self, lease: Lease) -> Result<Lease, RouterDeskError> {
        let server = require_server(&self.servers, &lease.pool).await?;
        lease.validate_for(&server)?;
        let recorded = self.leases.upsert(lease).await?;
        tracing::debug!(
            server = %recorded.pool,
            ip = %recorded.ip_address,
            mac = %recorded.mac_address,
            "lease recorded"
        );
        Ok(recorded)
    }
}
