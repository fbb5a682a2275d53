//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod blocklist;
#[allow(clippy::missing_errors_doc)]
pub mod leases;
#[allow(clippy::missing_errors_doc)]
pub mod mappings;
#[allow(clippy::missing_errors_doc)]
pub mod servers;
#[allow(clippy::missing_errors_doc)]
pub mod services;

use axum::Router;
use axum::routing::{get, put};

use routerdesk_app::ports::ConfigBackend;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<B>() -> Router<AppState<B>>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    Router::new()
        // DHCP servers
        .route(
            "/dhcp/servers",
            get(servers::list::<B>).post(servers::create::<B>),
        )
        .route(
            "/dhcp/servers/{name}",
            get(servers::get::<B>)
                .put(servers::update::<B>)
                .delete(servers::delete::<B>),
        )
        .route("/dhcp/servers/{name}/status", put(servers::set_status::<B>))
        // Static mappings
        .route(
            "/dhcp/servers/{name}/mappings",
            get(mappings::list::<B>).post(mappings::create::<B>),
        )
        .route(
            "/dhcp/servers/{name}/mappings/{id}",
            put(mappings::update::<B>).delete(mappings::delete::<B>),
        )
        // Leases
        .route(
            "/dhcp/servers/{name}/leases",
            get(leases::list::<B>).post(leases::record::<B>),
        )
        // Services
        .route(
            "/services/{kind}",
            get(services::get::<B>)
                .put(services::put::<B>)
                .delete(services::delete::<B>),
        )        // Blacklist networks
        .route(
            "/blacklist/networks",
            get(blocklist::list::<B>).put(blocklist::replace::<B>),
        )
}
