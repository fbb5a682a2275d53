//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod blocklist_service;
pub mod dhcp_service;
pub mod lease_service;
pub mod mapping_service;
pub mod service_config_service;

use routerdesk_domain::dhcp::DhcpServer;
use routerdesk_domain::error::{NotFoundError, RouterDeskError};
use routerdesk_domain::id::ServerName;

use crate::ports::DhcpServerRepository;

/// Load a server or fail with [`NotFoundError`].
async fn require_server<R: DhcpServerRepository>(
    repo: &R,
    name: &ServerName,
) -> Result<DhcpServer, RouterDeskError> {
    repo.get_by_name(name).await?.ok_or_else(|| {
        NotFoundError {
            entity: "DhcpServer",
            id: name.to_string(),
        }
        .into()
    })
}
