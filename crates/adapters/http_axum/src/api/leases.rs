//! JSON REST handlers for leases.
//!
//! `POST` is the hook the DHCP daemon calls whenever it hands out or renews
//! an address.

use std::net::Ipv4Addr;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use routerdesk_app::ports::ConfigBackend;
use routerdesk_domain::dhcp::Lease;
use routerdesk_domain::id::ServerName;
use routerdesk_domain::net::MacAddress;
use routerdesk_domain::time::Timestamp;

use crate::error::ApiError;
use crate::state::AppState;

/// Lease reported by the DHCP daemon.
#[derive(Debug, Deserialize)]
pub struct LeaseRequest {
    pub ip_address: Ipv4Addr,
    pub mac_address: MacAddress,
    pub expiration: Timestamp,
    pub hostname: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Lease>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the record endpoint.
pub enum RecordResponse {
    Ok(Json<Lease>),
}

impl IntoResponse for RecordResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/dhcp/servers/{name}/leases`
pub async fn list<B>(
    State(state): State<AppState<B>>,
    Path(server): Path<String>,
) -> Result<ListResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let server = ServerName::from_str(&server)?;
    let leases = state.backend.list_leases(&server).await?;
    Ok(ListResponse::Ok(Json(leases)))
}

/// `POST /api/dhcp/servers/{name}/leases`
pub async fn record<B>(
    State(state): State<AppState<B>>,
    Path(server): Path<String>,
    Json(req): Json<LeaseRequest>,
) -> Result<RecordResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let pool = ServerName::from_str(&server)?;
    let lease = Lease {
        ip_address: req.ip_address,
        mac_address: req.mac_address,
        expiration: req.expiration,
        pool,
        hostname: req.hostname.filter(|hostname| !hostname.is_empty()),
    };
    let recorded = state.backend.record_lease(lease).await?;
    Ok(RecordResponse::Ok(Json(recorded)))
}
