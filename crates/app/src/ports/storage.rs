//! Storage port: repository traits for persistence.

use std::future::Future;

use ipnetwork::Ipv4Network;

use routerdesk_domain::blocklist::NetworkDiff;
use routerdesk_domain::dhcp::{DhcpServer, Lease, StaticMapping};
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

/// Repository for persisting and querying [`DhcpServer`]s.
pub trait DhcpServerRepository {
    /// Create a new server in storage.
    fn create(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send;

    /// Get a server by its name.
    fn get_by_name(
        &self,
        name: &ServerName,
    ) -> impl Future<Output = Result<Option<DhcpServer>, RouterDeskError>> + Send;

    /// Get all servers, ordered by name.
    fn get_all(&self) -> impl Future<Output = Result<Vec<DhcpServer>, RouterDeskError>> + Send;

    /// Update an existing server.
    fn update(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send;

    /// Delete a server by name. Deleting a missing server is not an error.
    ///
    /// Stores that hold mappings and leases next to the server remove them
    /// in the same write.
    fn delete(&self, name: &ServerName)
    -> impl Future<Output = Result<(), RouterDeskError>> + Send;
}

/// Repository for the [`StaticMapping`]s of each server.
pub trait StaticMappingRepository {
    /// Create a new mapping under `server`.
    fn create(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send;

    /// Get one mapping of `server`.
    fn get(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> impl Future<Output = Result<Option<StaticMapping>, RouterDeskError>> + Send;

    /// Get all mappings of `server`, ordered by id.
    fn find_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<StaticMapping>, RouterDeskError>> + Send;

    /// Update an existing mapping of `server`.
    fn update(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send;

    /// Delete one mapping. Deleting a missing mapping is not an error.
    fn delete(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send;

    /// Delete every mapping of `server`.
    fn delete_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send;
}

/// Repository for [`Lease`]s reported by the DHCP daemon.
pub trait LeaseRepository {
    /// Insert a lease, replacing any lease of the same pool and address.
    fn upsert(&self, lease: Lease) -> impl Future<Output = Result<Lease, RouterDeskError>> + Send;

    /// Get all leases of `server`, ordered by address.
    fn find_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<Lease>, RouterDeskError>> + Send;

    /// Delete every lease of `server`.
    fn delete_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send;
}

/// Repository for the singleton service settings.
pub trait ServiceConfigRepository {
    /// Get the stored settings of `kind`, if any.
    fn get(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<Option<ServiceSettings>, RouterDeskError>> + Send;

    /// Store settings, replacing previous ones of the same kind.
    fn put(
        &self,
        settings: ServiceSettings,
    ) -> impl Future<Output = Result<ServiceSettings, RouterDeskError>> + Send;

    /// Remove the settings of `kind`. Removing absent settings is not an error.
    fn delete(&self, kind: ServiceKind)
    -> impl Future<Output = Result<(), RouterDeskError>> + Send;
}

/// Repository for the networks blocked by the DNS blacklist.
pub trait BlockedNetworkRepository {
    /// Get every stored block, ordered by network.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Ipv4Network>, RouterDeskError>> + Send;

    /// Insert `diff.added` and remove `diff.deleted` in one write.
    fn apply(&self, diff: &NetworkDiff)
    -> impl Future<Output = Result<(), RouterDeskError>> + Send;
}
