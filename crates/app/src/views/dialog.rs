//! Per-server dialog: leases, static map and details of one DHCP server.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use routerdesk_domain::dhcp::PoolStats;
use routerdesk_domain::error::{NotFoundError, RouterDeskError, ValidationError};
use routerdesk_domain::id::{MappingId, ServerName};

use crate::ports::{ConfigBackend, ServerSummary};
use crate::views::drafts::{DhcpServerDraft, StaticMappingDraft};
use crate::views::form::FormView;
use crate::views::rows::{LeaseRow, MappingRow, MappingScope};
use crate::views::session::{Applied, ViewContext, ViewSession};
use crate::views::table::TableView;

/// Tab of the server dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogTab {
    Leases,
    Mappings,
    Details,
}

impl DialogTab {
    pub const ALL: [Self; 3] = [Self::Leases, Self::Mappings, Self::Details];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leases => "leases",
            Self::Mappings => "mappings",
            Self::Details => "details",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Leases => "Leases",
            Self::Mappings => "Static Mapping",
            Self::Details => "Details",
        }
    }
}

impl fmt::Display for DialogTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialogTab {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "tab",
                reason: format!("unknown tab {s:?}"),
            })
    }
}

/// Dialog opened from a row of the server table.
///
/// A disabled server shows its static map without edit actions.
#[derive(Debug, Clone)]
pub struct DhcpServerDialog {
    summary: ServerSummary,
    tab: DialogTab,
    leases: TableView<LeaseRow>,
    mappings: TableView<MappingRow>,
    details: FormView<DhcpServerDraft>,
}

impl DhcpServerDialog {
    /// Select `name` and load everything the dialog shows.
    ///
    /// A failure of one table leaves that table in its failed state; the
    /// dialog still opens.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] when the server is gone, or the
    /// backend error.
    pub async fn open<B>(
        session: &ViewSession,
        backend: &B,
        name: &ServerName,
        tab: DialogTab,
    ) -> Result<Applied<Self>, RouterDeskError>
    where
        B: ConfigBackend + Sync,
    {
        session.navigate(ViewContext {
            selected: Some(name.clone()),
            dialog: Some(tab),
        });
        let ticket = session.ticket();
        let summary = backend.get_server(name).await?;
        let scope = MappingScope {
            server: name.clone(),
            read_only: !summary.server.enabled,
        };
        let Applied::Applied(leases) = TableView::load(session, backend, name).await else {
            return Ok(Applied::Discarded);
        };
        let Applied::Applied(mappings) = TableView::load(session, backend, &scope).await else {
            return Ok(Applied::Discarded);
        };
        let details = FormView::edit(&summary.server);
        Ok(session.apply(
            ticket,
            Self {
                summary,
                tab,
                leases,
                mappings,
                details,
            },
        ))
    }

    #[must_use]
    pub fn summary(&self) -> &ServerSummary {
        &self.summary
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.summary.stats
    }

    #[must_use]
    pub fn tab(&self) -> DialogTab {
        self.tab
    }

    pub fn select_tab(&mut self, session: &ViewSession, tab: DialogTab) {
        self.tab = tab;
        session.navigate(ViewContext {
            selected: Some(self.summary.server.name.clone()),
            dialog: Some(tab),
        });
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        !self.summary.server.enabled
    }

    #[must_use]
    pub fn leases(&self) -> &TableView<LeaseRow> {
        &self.leases
    }

    pub fn leases_mut(&mut self) -> &mut TableView<LeaseRow> {
        &mut self.leases
    }

    #[must_use]
    pub fn mappings(&self) -> &TableView<MappingRow> {
        &self.mappings
    }

    pub fn mappings_mut(&mut self) -> &mut TableView<MappingRow> {
        &mut self.mappings
    }

    #[must_use]
    pub fn details(&self) -> &FormView<DhcpServerDraft> {
        &self.details
    }

    pub fn details_mut(&mut self) -> &mut FormView<DhcpServerDraft> {
        &mut self.details
    }

    /// Create form of a static mapping; `None` when the map is read-only.
    #[must_use]
    pub fn mapping_form(&self) -> Option<FormView<StaticMappingDraft>> {
        (!self.is_read_only()).then(|| FormView::create(&self.summary.server.name))
    }

    /// Edit form of one listed mapping; `None` when read-only or unlisted.
    #[must_use]
    pub fn edit_mapping(&self, id: &MappingId) -> Option<FormView<StaticMappingDraft>> {
        if self.is_read_only() {
            return None;
        }
        self.mappings
            .row(id)
            .map(|row| FormView::edit(&row.mapping))
    }

    /// Pre-filled static mapping form for the lease on `ip`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] when no such lease is listed.
    pub fn map_static(&self, ip: Ipv4Addr) -> Result<FormView<StaticMappingDraft>, RouterDeskError> {
        self.leases
            .row(&ip)
            .map(|row| StaticMappingDraft::map_static_form(&row.lease))
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Lease",
                    id: ip.to_string(),
                }
                .into()
            })
    }

    /// Leave the dialog; responses still in flight are discarded.
    pub fn close(self, session: &ViewSession) {
        session.navigate_away();
    }
}
