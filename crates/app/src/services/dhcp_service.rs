//! DHCP server service: use-cases for managing DHCP servers.

use routerdesk_domain::dhcp::{DhcpServer, PoolStats};
use routerdesk_domain::error::{ConflictError, RouterDeskError, ValidationError};
use routerdesk_domain::id::ServerName;

use super::require_server;
use crate::ports::{
    DhcpServerRepository, LeaseRepository, ServerSummary, StaticMappingRepository,
};

/// Application service for DHCP server CRUD and pool counters.
pub struct DhcpService<SR, MR, LR> {
    servers: SR,
    mappings: MR,
    leases: LR,
}

impl<SR, MR, LR> DhcpService<SR, MR, LR>
where
    SR: DhcpServerRepository,
    MR: StaticMappingRepository,
    LR: LeaseRepository,
{
    /// Create a new service backed by the given repositories.
    pub fn new(servers: SR, mappings: MR, leases: LR) -> Self {
        Self {
            servers,
            mappings,
            leases,
        }
    }

    /// Create a new server after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] if invariants fail,
    /// [`RouterDeskError::Conflict`] when the name or the subnet is already
    /// served, or a storage error from the repository.
    pub async fn create_server(&self, server: DhcpServer) -> Result<DhcpServer, RouterDeskError> {
        server.validate()?;
        let existing = self.servers.get_all().await?;
        if existing.iter().any(|other| other.name == server.name) {
            tracing::warn!(server = %server.name, "rejected duplicate DHCP server name");
            return Err(ConflictError {
                entity: "DhcpServer",
                field: "name",
                value: server.name.to_string(),
            }
            .into());
        }
        if existing.iter().any(|other| other.subnet == server.subnet) {
            tracing::warn!(subnet = %server.subnet, "rejected duplicate DHCP subnet");
            return Err(ConflictError {
                entity: "DhcpServer",
                field: "subnet",
                value: server.subnet.to_string(),
            }
            .into());
        }
        let created = self.servers.create(server).await?;
        tracing::info!(server = %created.name, subnet = %created.subnet, "DHCP server created");
        Ok(created)
    }

    /// Look up a server by name.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] when no server is named `name`,
    /// or a storage error from the repository.
    pub async fn get_server(&self, name: &ServerName) -> Result<DhcpServer, RouterDeskError> {
        require_server(&self.servers, name).await
    }

    /// List all servers, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_servers(&self) -> Result<Vec<DhcpServer>, RouterDeskError> {
        let mut servers = self.servers.get_all().await?;
        servers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(servers)
    }

    /// Pool counters of one server, computed now.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] for an unknown server, or a
    /// storage error from the repositories.
    pub async fn summary(&self, name: &ServerName) -> Result<ServerSummary, RouterDeskError> {
        let server = require_server(&self.servers, name).await?;
        self.summarize(server).await
    }

    /// All servers with their pool counters.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn summaries(&self) -> Result<Vec<ServerSummary>, RouterDeskError> {
        let mut summaries = Vec::new();
        for server in self.list_servers().await? {
            summaries.push(self.summarize(server).await?);
        }
        Ok(summaries)
    }

    async fn summarize(&self, server: DhcpServer) -> Result<ServerSummary, RouterDeskError> {
        let leases = self.leases.find_by_server(&server.name).await?;
        let mappings = self.mappings.find_by_server(&server.name).await?;
        let stats = PoolStats::compute(&server, &leases, &mappings, routerdesk_domain::time::now());
        Ok(ServerSummary { server, stats })
    }

    /// Update an existing server. The subnet cannot change once created.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] for an unknown server,
    /// [`RouterDeskError::Validation`] if invariants fail or the subnet
    /// differs from the stored one, or a storage error from the repository.
    pub async fn update_server(&self, server: DhcpServer) -> Result<DhcpServer, RouterDeskError> {
        server.validate()?;
        let current = require_server(&self.servers, &server.name).await?;
        if current.subnet != server.subnet {
            tracing::warn!(server = %server.name, "rejected subnet change");
            return Err(ValidationError::InvalidField {
                field: "subnet",
                reason: format!("subnet of {} cannot be changed", server.name),
            }
            .into());
        }
        let updated = self.servers.update(server).await?;
        tracing::info!(server = %updated.name, enabled = updated.enabled, "DHCP server updated");
        Ok(updated)
    }

    /// Enable or disable a server.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] for an unknown server, or a
    /// storage error from the repository.
    pub async fn set_enabled(
        &self,
        name: &ServerName,
        enabled: bool,
    ) -> Result<DhcpServer, RouterDeskError> {
        let mut server = require_server(&self.servers, name).await?;
        server.enabled = enabled;
        self.update_server(server).await
    }

    /// Delete a server with its mappings and leases. Missing servers are ignored.
    ///
    /// The server row is removed first, so a failed delete leaves its
    /// mappings and leases in place.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn delete_server(&self, name: &ServerName) -> Result<(), RouterDeskError> {
        self.servers.delete(name).await?;
        self.mappings.delete_by_server(name).await?;
        self.leases.delete_by_server(name).await?;
        tracing::info!(server = %name, "DHCP server deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        InMemoryLeaseRepo, InMemoryMappingRepo, InMemoryServerRepo, lan0, lease, mapping,
        server_name,
    };
    use std::net::Ipv4Addr;

    type Service = DhcpService<InMemoryServerRepo, InMemoryMappingRepo, InMemoryLeaseRepo>;

    fn make_service() -> (Service, InMemoryMappingRepo, InMemoryLeaseRepo) {
        let mappings = InMemoryMappingRepo::default();
        let leases = InMemoryLeaseRepo::default();
        let svc = DhcpService::new(
            InMemoryServerRepo::default(),
            mappings.clone(),
            leases.clone(),
        );
        (svc, mappings, leases)
    }

    #[tokio::test]
    async fn should_create_server_and_read_back_identical_fields() {
        let (svc, _, _) = make_service();
        let created = svc.create_server(lan0()).await.unwrap();
        let fetched = svc.get_server(&server_name("lan0")).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched, lan0());
        assert_eq!(fetched.pool_size(), 91);
    }

    #[tokio::test]
    async fn should_return_conflict_when_name_taken() {
        let (svc, _, _) = make_service();
        svc.create_server(lan0()).await.unwrap();
        let mut other = lan0();
        other.subnet = "198.51.100.0/24".parse().unwrap();
        other.range_start = None;
        other.range_stop = None;
        other.router = None;
        let err = svc.create_server(other).await.unwrap_err();
        assert!(matches!(
            err,
            RouterDeskError::Conflict(ConflictError { field: "name", .. })
        ));
    }

    #[tokio::test]
    async fn should_return_conflict_when_subnet_already_served() {
        let (svc, _, _) = make_service();
        svc.create_server(lan0()).await.unwrap();
        let mut other = lan0();
        other.name = server_name("lan1");
        let err = svc.create_server(other).await.unwrap_err();
        assert_eq!(err.field(), Some("subnet"));
    }

    #[tokio::test]
    async fn should_return_not_found_when_server_missing() {
        let (svc, _, _) = make_service();
        let err = svc.get_server(&server_name("ghost")).await.unwrap_err();
        assert!(matches!(err, RouterDeskError::NotFound(_)));
        let err = svc.update_server(lan0()).await.unwrap_err();
        assert!(matches!(err, RouterDeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_reject_subnet_change_on_update() {
        let (svc, _, _) = make_service();
        svc.create_server(lan0()).await.unwrap();
        let mut moved = lan0();
        moved.subnet = "192.0.2.0/25".parse().unwrap();
        let err = svc.update_server(moved).await.unwrap_err();
        assert_eq!(err.field(), Some("subnet"));
    }

    #[tokio::test]
    async fn should_update_mutable_fields() {
        let (svc, _, _) = make_service();
        svc.create_server(lan0()).await.unwrap();
        let mut changed = lan0();
        changed.lease_seconds = 3600;
        changed.domain = Some("home.arpa".to_string());
        changed.range_stop = Some(Ipv4Addr::new(192, 0, 2, 50));
        svc.update_server(changed.clone()).await.unwrap();
        assert_eq!(svc.get_server(&changed.name).await.unwrap(), changed);
    }

    #[tokio::test]
    async fn should_toggle_enabled_flag() {
        let (svc, _, _) = make_service();
        svc.create_server(lan0()).await.unwrap();
        let disabled = svc.set_enabled(&server_name("lan0"), false).await.unwrap();
        assert!(!disabled.enabled);
        let enabled = svc.set_enabled(&server_name("lan0"), true).await.unwrap();
        assert!(enabled.enabled);
    }

    #[tokio::test]
    async fn should_compute_pool_counters_in_summary() {
        let (svc, mappings, leases) = make_service();
        svc.create_server(lan0()).await.unwrap();
        leases
            .upsert(lease(20, "00:11:22:33:44:20", Some("laptop")))
            .await
            .unwrap();
        leases.upsert(lease(21, "00:11:22:33:44:21", None)).await.unwrap();
        mappings
            .create(&server_name("lan0"), mapping("nas", "aa:bb:cc:dd:ee:05", 5))
            .await
            .unwrap();

        let summary = svc.summary(&server_name("lan0")).await.unwrap();
        assert_eq!(summary.stats.pool_size, 91);
        assert_eq!(summary.stats.leased, 2);
        assert_eq!(summary.stats.available, 89);
        assert_eq!(summary.stats.static_count, 1);
    }

    #[tokio::test]
    async fn should_cascade_delete_and_ignore_missing_server() {
        let (svc, mappings, leases) = make_service();
        svc.create_server(lan0()).await.unwrap();
        leases.upsert(lease(20, "00:11:22:33:44:20", None)).await.unwrap();
        mappings
            .create(&server_name("lan0"), mapping("nas", "aa:bb:cc:dd:ee:05", 5))
            .await
            .unwrap();

        svc.delete_server(&server_name("lan0")).await.unwrap();
        assert!(svc.list_servers().await.unwrap().is_empty());
        assert!(
            leases
                .find_by_server(&server_name("lan0"))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            mappings
                .find_by_server(&server_name("lan0"))
                .await
                .unwrap()
                .is_empty()
        );

        svc.delete_server(&server_name("lan0")).await.unwrap();
    }

    #[tokio::test]
    async fn should_keep_mappings_and_leases_when_server_delete_fails() {
        let servers = InMemoryServerRepo::default();
        let mappings = InMemoryMappingRepo::default();
        let leases = InMemoryLeaseRepo::default();
        let svc = DhcpService::new(servers.clone(), mappings.clone(), leases.clone());
        svc.create_server(lan0()).await.unwrap();
        mappings
            .create(&server_name("lan0"), mapping("nas", "aa:bb:cc:dd:ee:05", 5))
            .await
            .unwrap();
        leases.upsert(lease(20, "00:11:22:33:44:20", None)).await.unwrap();

        servers.tracker.set_down(true);
        let err = svc.delete_server(&server_name("lan0")).await.unwrap_err();
        assert!(matches!(err, RouterDeskError::Transport(_)));
        servers.tracker.set_down(false);

        assert_eq!(svc.list_servers().await.unwrap().len(), 1);
        assert_eq!(
            mappings.find_by_server(&server_name("lan0")).await.unwrap().len(),
            1
        );
        assert_eq!(
            leases.find_by_server(&server_name("lan0")).await.unwrap().len(),
            1
        );
    }
}
