//! In-process [`ConfigBackend`] built from the use-case services.

use std::future::Future;

use ipnetwork::Ipv4Network;

use routerdesk_domain::blocklist::NetworkDiff;
use routerdesk_domain::dhcp::{DhcpServer, Lease, StaticMapping};
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

use crate::ports::{
    BlockedNetworkRepository, ConfigBackend, DhcpServerRepository, LeaseRepository, ServerSummary,
    ServiceConfigRepository, StaticMappingRepository,
};
use crate::services::blocklist_service::BlocklistService;
use crate::services::dhcp_service::DhcpService;
use crate::services::lease_service::LeaseService;
use crate::services::mapping_service::MappingService;
use crate::services::service_config_service::ServiceConfigService;

/// The configuration backend served by this process.
pub struct AdminBackend<SR, MR, LR, CR, BR> {
    dhcp: DhcpService<SR, MR, LR>,
    mappings: MappingService<SR, MR>,
    leases: LeaseService<SR, LR>,
    services: ServiceConfigService<CR>,
    blocklist: BlocklistService<BR>,
}

impl<SR, MR, LR, CR, BR> AdminBackend<SR, MR, LR, CR, BR>
where
    SR: DhcpServerRepository + Clone,
    MR: StaticMappingRepository + Clone,
    LR: LeaseRepository + Clone,
    CR: ServiceConfigRepository,
    BR: BlockedNetworkRepository,
{
    /// Wire the services over the given repositories.
    pub fn new(servers: SR, mappings: MR, leases: LR, configs: CR, blocked: BR) -> Self {
        Self {
            dhcp: DhcpService::new(servers.clone(), mappings.clone(), leases.clone()),
            mappings: MappingService::new(servers.clone(), mappings),
            leases: LeaseService::new(servers, leases),
            services: ServiceConfigService::new(configs),
            blocklist: BlocklistService::new(blocked),
        }
    }
}

impl<SR, MR, LR, CR, BR> ConfigBackend for AdminBackend<SR, MR, LR, CR, BR>
where
    SR: DhcpServerRepository + Send + Sync,
    MR: StaticMappingRepository + Send + Sync,
    LR: LeaseRepository + Send + Sync,
    CR: ServiceConfigRepository + Send + Sync,
    BR: BlockedNetworkRepository + Send + Sync,
{
    fn list_servers(
        &self,
    ) -> impl Future<Output = Result<Vec<ServerSummary>, RouterDeskError>> + Send {
        self.dhcp.summaries()
    }

    fn get_server(
        &self,
        name: &ServerName,
    ) -> impl Future<Output = Result<ServerSummary, RouterDeskError>> + Send {
        self.dhcp.summary(name)
    }

    fn create_server(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send {
        self.dhcp.create_server(server)
    }

    fn update_server(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send {
        self.dhcp.update_server(server)
    }

    fn set_server_enabled(
        &self,
        name: &ServerName,
        enabled: bool,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send {
        self.dhcp.set_enabled(name, enabled)
    }

    fn delete_server(
        &self,
        name: &ServerName,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        self.dhcp.delete_server(name)
    }

    fn list_mappings(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<StaticMapping>, RouterDeskError>> + Send {
        self.mappings.list_mappings(server)
    }

    fn create_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send {
        self.mappings.create_mapping(server, mapping)
    }

    fn update_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send {
        self.mappings.update_mapping(server, mapping)
    }

    fn delete_mapping(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        self.mappings.delete_mapping(server, id)
    }

    fn list_leases(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<Lease>, RouterDeskError>> + Send {
        self.leases.list_leases(server)
    }

    fn record_lease(
        &self,
        lease: Lease,
    ) -> impl Future<Output = Result<Lease, RouterDeskError>> + Send {
        self.leases.record_lease(lease)
    }

    fn get_service(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<Option<ServiceSettings>, RouterDeskError>> + Send {
        self.services.get(kind)
    }

    fn put_service(
        &self,
        settings: ServiceSettings,
    ) -> impl Future<Output = Result<ServiceSettings, RouterDeskError>> + Send {
        self.services.put(settings)
    }

    fn delete_service(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        self.services.delete(kind)
    }

    fn list_blocked_networks(
        &self,
    ) -> impl Future<Output = Result<Vec<Ipv4Network>, RouterDeskError>> + Send {
        self.blocklist.list()
    }

    fn update_blocked_networks(
        &self,
        feed: &str,
    ) -> impl Future<Output = Result<NetworkDiff, RouterDeskError>> + Send {
        self.blocklist.replace_from_feed(feed)
    }
}
