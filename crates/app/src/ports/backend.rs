//! Backend port: the configuration API the views are written against.
//!
//! The dashboard never touches repositories directly: every list, create,
//! update and delete goes through [`ConfigBackend`], so the same views work
//! against the in-process [`AdminBackend`](crate::backend::AdminBackend) and
//! against test doubles.

use std::future::Future;

use serde::{Deserialize, Serialize};

use ipnetwork::Ipv4Network;

use routerdesk_domain::blocklist::NetworkDiff;
use routerdesk_domain::dhcp::{DhcpServer, Lease, PoolStats, StaticMapping};
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

/// A DHCP server together with its current pool counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub server: DhcpServer,
    pub stats: PoolStats,
}

/// Request/response contract of the configuration backend.
///
/// Deletes are idempotent: removing something that does not exist succeeds.
pub trait ConfigBackend {
    /// List every DHCP server with its pool counters.
    fn list_servers(
        &self,
    ) -> impl Future<Output = Result<Vec<ServerSummary>, RouterDeskError>> + Send;

    /// Get one DHCP server with its pool counters.
    fn get_server(
        &self,
        name: &ServerName,
    ) -> impl Future<Output = Result<ServerSummary, RouterDeskError>> + Send;

    /// Create a DHCP server; fails with a conflict if the name or subnet is taken.
    fn create_server(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send;

    /// Update a DHCP server; fails if it does not exist.
    fn update_server(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send;

    /// Enable or disable a DHCP server; fails if it does not exist.
    fn set_server_enabled(
        &self,
        name: &ServerName,
        enabled: bool,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send;

    /// Delete a DHCP server together with its mappings and leases.
    fn delete_server(
        &self,
        name: &ServerName,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send;

    /// List the static mappings of a server.
    fn list_mappings(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<StaticMapping>, RouterDeskError>> + Send;

    /// Create a static mapping; id, MAC and IP must be unique within the server.
    fn create_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send;

    /// Update a static mapping; fails if it does not exist.
    fn update_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send;

    /// Delete a static mapping.
    fn delete_mapping(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send;

    /// Query the leases of a server.
    fn list_leases(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<Lease>, RouterDeskError>> + Send;

    /// Record a lease reported by the DHCP daemon.
    fn record_lease(
        &self,
        lease: Lease,
    ) -> impl Future<Output = Result<Lease, RouterDeskError>> + Send;

    /// Get the settings of a singleton service, if configured.
    fn get_service(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<Option<ServiceSettings>, RouterDeskError>> + Send;

    /// Create or replace the settings of a singleton service.
    fn put_service(
        &self,
        settings: ServiceSettings,
    ) -> impl Future<Output = Result<ServiceSettings, RouterDeskError>> + Send;

    /// Remove the settings of a singleton service.
    fn delete_service(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send;

    /// List the networks blocked by the DNS blacklist.
    fn list_blocked_networks(
        &self,
    ) -> impl Future<Output = Result<Vec<Ipv4Network>, RouterDeskError>> + Send;

    /// Replace the blocked networks with those named in a threat feed.
    fn update_blocked_networks(
        &self,
        feed: &str,
    ) -> impl Future<Output = Result<NetworkDiff, RouterDeskError>> + Send;
}
