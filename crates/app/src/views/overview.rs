//! Landing page counters.

use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::service::ServiceKind;

use crate::ports::ConfigBackend;
use crate::views::session::{Applied, ViewSession};

/// Counts shown on the home page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overview {
    pub servers: usize,
    pub enabled_servers: usize,
    pub static_mappings: u64,
    pub active_leases: u64,
    /// Services with stored settings, in display order.
    pub configured: Vec<ServiceKind>,
}

impl Overview {
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn load<B>(session: &ViewSession, backend: &B) -> Result<Applied<Self>, RouterDeskError>
    where
        B: ConfigBackend + Sync,
    {
        let ticket = session.ticket();
        let summaries = backend.list_servers().await?;
        let mut configured = Vec::new();
        for kind in ServiceKind::ALL {
            if backend.get_service(kind).await?.is_some() {
                configured.push(kind);
            }
        }
        let overview = Self {
            servers: summaries.len(),
            enabled_servers: summaries.iter().filter(|s| s.server.enabled).count(),
            static_mappings: summaries
                .iter()
                .map(|s| u64::from(s.stats.static_count))
                .sum(),
            active_leases: summaries.iter().map(|s| u64::from(s.stats.leased)).sum(),
            configured,
        };
        Ok(session.apply(ticket, overview))
    }
}
