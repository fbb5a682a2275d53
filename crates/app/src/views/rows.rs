//! Row types of the entity tables and the actions each one supports.

use std::fmt;
use std::future::Future;
use std::net::Ipv4Addr;

use routerdesk_domain::dhcp::{DhcpServer, Lease, StaticMapping};
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::{MappingId, ServerName};

use crate::guard::EntityKey;
use crate::ports::{ConfigBackend, ServerSummary};
use crate::views::session::{Applied, ViewSession};

/// Action offered in a row's action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    ViewLeases,
    ConfigureStaticMap,
    /// Static map of a disabled server, shown without edit actions.
    ViewStaticMap,
    ViewDetails,
    Delete,
    ToggleStatus {
        enable: bool,
    },
    Config,
    MapToStatic,
}

impl RowAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ViewLeases => "View Leases",
            Self::ConfigureStaticMap => "Configure Static Map",
            Self::ViewStaticMap => "View Static Map",
            Self::ViewDetails => "View Details",
            Self::Delete => "Delete",
            Self::ToggleStatus { enable: true } => "Enable",
            Self::ToggleStatus { enable: false } => "Disable",
            Self::Config => "Config",
            Self::MapToStatic => "Map Static IP",
        }
    }

    /// Stable identifier used in links and tests.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::ViewLeases => "leases",
            Self::ConfigureStaticMap => "mappings",
            Self::ViewStaticMap => "mappings-readonly",
            Self::ViewDetails => "details",
            Self::Delete => "delete",
            Self::ToggleStatus { .. } => "status",
            Self::Config => "config",
            Self::MapToStatic => "map-static",
        }
    }
}

/// One row of an entity table.
pub trait TableRow: Clone + Send + Sync {
    type Key: Clone + Ord + fmt::Display + Send + Sync;

    /// Column headers, in display order.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    /// Summary cells, one per column.
    fn cells(&self) -> Vec<String>;

    fn actions(&self) -> Vec<RowAction>;
}

/// Rows that can be fetched from the backend.
pub trait ListableRow: TableRow + Sized {
    type Scope: Send + Sync;

    fn fetch<B>(
        backend: &B,
        scope: &Self::Scope,
    ) -> impl Future<Output = Result<Vec<Self>, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync;
}

/// Rows whose entity can be deleted.
pub trait DeletableRow: TableRow {
    fn entity_key(&self) -> EntityKey;

    fn delete<B>(&self, backend: &B) -> impl Future<Output = Result<(), RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync;
}

/// A DHCP server with its pool counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRow {
    pub summary: ServerSummary,
}

impl ServerRow {
    #[must_use]
    pub fn server(&self) -> &DhcpServer {
        &self.summary.server
    }

    /// Flip the enabled flag of the server behind this row.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Busy`] while another change to the server
    /// is in flight, or the backend error.
    pub async fn toggle_status<B>(
        &self,
        session: &ViewSession,
        backend: &B,
    ) -> Result<Applied<DhcpServer>, RouterDeskError>
    where
        B: ConfigBackend + Sync,
    {
        let _permit = session.begin_mutation(self.entity_key())?;
        let ticket = session.ticket();
        let updated = backend
            .set_server_enabled(&self.server().name, !self.server().enabled)
            .await?;
        Ok(session.apply(ticket, updated))
    }
}

impl TableRow for ServerRow {
    type Key = ServerName;

    const COLUMNS: &'static [&'static str] =
        &["Name", "Subnet", "Pool size", "Leased", "Available", "Static"];

    fn key(&self) -> ServerName {
        self.server().name.clone()
    }

    fn cells(&self) -> Vec<String> {
        let stats = self.summary.stats;
        vec![
            self.server().name.to_string(),
            self.server().subnet.to_string(),
            stats.pool_size.to_string(),
            stats.leased.to_string(),
            stats.available.to_string(),
            stats.static_count.to_string(),
        ]
    }

    fn actions(&self) -> Vec<RowAction> {
        let enabled = self.server().enabled;
        vec![
            RowAction::ViewLeases,
            if enabled {
                RowAction::ConfigureStaticMap
            } else {
                RowAction::ViewStaticMap
            },
            RowAction::ViewDetails,
            RowAction::Delete,
            RowAction::ToggleStatus { enable: !enabled },
        ]
    }
}

impl ListableRow for ServerRow {
    type Scope = ();

    fn fetch<B>(
        backend: &B,
        _scope: &(),
    ) -> impl Future<Output = Result<Vec<Self>, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        async move {
            let summaries = backend.list_servers().await?;
            Ok(summaries
                .into_iter()
                .map(|summary| Self { summary })
                .collect())
        }
    }
}

impl DeletableRow for ServerRow {
    fn entity_key(&self) -> EntityKey {
        EntityKey::Server(self.key())
    }

    fn delete<B>(&self, backend: &B) -> impl Future<Output = Result<(), RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        backend.delete_server(&self.summary.server.name)
    }
}

/// Which static map to list, and whether it can be edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingScope {
    pub server: ServerName,
    pub read_only: bool,
}

/// A static mapping of one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRow {
    pub server: ServerName,
    pub mapping: StaticMapping,
    pub read_only: bool,
}

impl TableRow for MappingRow {
    type Key = MappingId;

    const COLUMNS: &'static [&'static str] = &["Name", "MAC Address", "IP Address"];

    fn key(&self) -> MappingId {
        self.mapping.id.clone()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.mapping.id.to_string(),
            self.mapping.mac_address.to_string(),
            self.mapping.ip_address.to_string(),
        ]
    }

    fn actions(&self) -> Vec<RowAction> {
        if self.read_only {
            Vec::new()
        } else {
            vec![RowAction::Config, RowAction::Delete]
        }
    }
}

impl ListableRow for MappingRow {
    type Scope = MappingScope;

    fn fetch<B>(
        backend: &B,
        scope: &MappingScope,
    ) -> impl Future<Output = Result<Vec<Self>, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        async move {
            let mappings = backend.list_mappings(&scope.server).await?;
            Ok(mappings
                .into_iter()
                .map(|mapping| Self {
                    server: scope.server.clone(),
                    mapping,
                    read_only: scope.read_only,
                })
                .collect())
        }
    }
}

impl DeletableRow for MappingRow {
    fn entity_key(&self) -> EntityKey {
        EntityKey::Mapping(self.server.clone(), self.key())
    }

    fn delete<B>(&self, backend: &B) -> impl Future<Output = Result<(), RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        backend.delete_mapping(&self.server, &self.mapping.id)
    }
}

/// A lease observed on one server. Leases are never deleted from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseRow {
    pub lease: Lease,
}

impl TableRow for LeaseRow {
    type Key = Ipv4Addr;

    const COLUMNS: &'static [&'static str] =
        &["IP Address", "MAC Address", "Expiration", "Pool", "Hostname"];

    fn key(&self) -> Ipv4Addr {
        self.lease.ip_address
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.lease.ip_address.to_string(),
            self.lease.mac_address.to_string(),
            self.lease
                .expiration
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            self.lease.pool.to_string(),
            self.lease.hostname.clone().unwrap_or_default(),
        ]
    }

    fn actions(&self) -> Vec<RowAction> {
        vec![RowAction::MapToStatic]
    }
}

impl ListableRow for LeaseRow {
    type Scope = ServerName;

    fn fetch<B>(
        backend: &B,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<Self>, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        async move {
            let leases = backend.list_leases(server).await?;
            Ok(leases.into_iter().map(|lease| Self { lease }).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, lan0, lease, mapping, server_name};
    use routerdesk_domain::dhcp::PoolStats;

    fn server_row(enabled: bool) -> ServerRow {
        let mut server = lan0();
        server.enabled = enabled;
        ServerRow {
            summary: ServerSummary {
                stats: PoolStats::compute(&server, &[], &[], routerdesk_domain::time::now()),
                server,
            },
        }
    }

    #[test]
    fn should_offer_configure_static_map_for_enabled_server() {
        let actions = server_row(true).actions();
        assert_eq!(
            actions,
            vec![
                RowAction::ViewLeases,
                RowAction::ConfigureStaticMap,
                RowAction::ViewDetails,
                RowAction::Delete,
                RowAction::ToggleStatus { enable: false },
            ]
        );
        assert_eq!(actions[4].label(), "Disable");
    }

    #[test]
    fn should_offer_read_only_static_map_for_disabled_server() {
        let actions = server_row(false).actions();
        assert!(actions.contains(&RowAction::ViewStaticMap));
        assert!(!actions.contains(&RowAction::ConfigureStaticMap));
        assert_eq!(RowAction::ToggleStatus { enable: true }.label(), "Enable");
    }

    #[test]
    fn should_render_server_summary_cells() {
        let cells = server_row(true).cells();
        assert_eq!(cells, vec!["lan0", "192.0.2.0/24", "91", "0", "91", "0"]);
        assert_eq!(cells.len(), ServerRow::COLUMNS.len());
    }

    #[test]
    fn should_hide_mapping_actions_when_read_only() {
        let row = MappingRow {
            server: server_name("lan0"),
            mapping: mapping("nas", "00:11:22:33:44:55", 20),
            read_only: true,
        };
        assert!(row.actions().is_empty());
        let editable = MappingRow {
            read_only: false,
            ..row
        };
        assert_eq!(editable.actions(), vec![RowAction::Config, RowAction::Delete]);
    }

    #[test]
    fn should_offer_only_map_to_static_on_lease_rows() {
        let row = LeaseRow {
            lease: lease(20, "00:11:22:33:44:20", Some("laptop")),
        };
        assert_eq!(row.actions(), vec![RowAction::MapToStatic]);
        assert_eq!(row.cells()[4], "laptop");
        assert_eq!(row.cells().len(), LeaseRow::COLUMNS.len());
    }

    #[tokio::test]
    async fn should_toggle_server_status_through_backend() {
        let harness = Harness::new();
        let backend = harness.backend();
        backend.create_server(lan0()).await.unwrap();
        let session = ViewSession::default();

        let updated = server_row(true)
            .toggle_status(&session, &backend)
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert!(!updated.enabled);
        let stored = backend.get_server(&server_name("lan0")).await.unwrap();
        assert!(!stored.server.enabled);
    }
}
