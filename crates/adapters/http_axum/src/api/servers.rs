//! JSON REST handlers for DHCP servers.

use std::net::Ipv4Addr;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use routerdesk_app::guard::EntityKey;
use routerdesk_app::ports::{ConfigBackend, ServerSummary};
use routerdesk_domain::dhcp::DhcpServer;
use routerdesk_domain::error::{RouterDeskError, ValidationError};
use routerdesk_domain::id::ServerName;
use routerdesk_domain::net::parse_subnet;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating or replacing a DHCP server.
///
/// `name` is required on create; on update the path names the server and a
/// body name, when present, must match it.
#[derive(Debug, Default, Deserialize)]
pub struct ServerRequest {
    pub name: Option<ServerName>,
    #[serde(default)]
    pub subnet: String,
    pub range_start: Option<Ipv4Addr>,
    pub range_stop: Option<Ipv4Addr>,
    pub router: Option<Ipv4Addr>,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
    pub unifi_controller: Option<Ipv4Addr>,
    pub domain: Option<String>,
    pub lease_seconds: Option<u32>,
    pub enabled: Option<bool>,
}

impl ServerRequest {
    fn into_server(self, name: ServerName) -> Result<DhcpServer, RouterDeskError> {
        let subnet = parse_subnet("subnet", &self.subnet)?;
        let mut builder = DhcpServer::builder()
            .name(name)
            .subnet(subnet)
            .range_start(self.range_start)
            .range_stop(self.range_stop)
            .router(self.router)
            .dns(self.dns1, self.dns2)
            .unifi_controller(self.unifi_controller)
            .domain(self.domain.filter(|domain| !domain.trim().is_empty()));
        if let Some(seconds) = self.lease_seconds {
            builder = builder.lease_seconds(seconds);
        }
        if let Some(enabled) = self.enabled {
            builder = builder.enabled(enabled);
        }
        builder.build()
    }
}

/// Request body for `PUT /api/dhcp/servers/{name}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub enabled: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ServerSummary>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<ServerSummary>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create and update endpoints.
pub enum SaveResponse {
    Created(Json<DhcpServer>),
    Ok(Json<DhcpServer>),
}

impl IntoResponse for SaveResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/dhcp/servers`
pub async fn list<B>(State(state): State<AppState<B>>) -> Result<ListResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let summaries = state.backend.list_servers().await?;
    Ok(ListResponse::Ok(Json(summaries)))
}

/// `GET /api/dhcp/servers/{name}`
pub async fn get<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = ServerName::from_str(&name)?;
    let summary = state.backend.get_server(&name).await?;
    Ok(GetResponse::Ok(Json(summary)))
}

/// `POST /api/dhcp/servers`
pub async fn create<B>(
    State(state): State<AppState<B>>,
    Json(req): Json<ServerRequest>,
) -> Result<SaveResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = req.name.clone().ok_or(ValidationError::MissingField {
        field: ServerName::FIELD,
    })?;
    let server = req.into_server(name.clone())?;
    let _permit = state.guard.try_acquire(EntityKey::Server(name))?;
    let created = state.backend.create_server(server).await?;
    Ok(SaveResponse::Created(Json(created)))
}

/// `PUT /api/dhcp/servers/{name}`
pub async fn update<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Json(req): Json<ServerRequest>,
) -> Result<SaveResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = ServerName::from_str(&name)?;
    if req.name.as_ref().is_some_and(|body| body != &name) {
        return Err(ValidationError::InvalidField {
            field: ServerName::FIELD,
            reason: format!("body names a different server than {name}"),
        }
        .into());
    }
    let server = req.into_server(name.clone())?;
    let _permit = state.guard.try_acquire(EntityKey::Server(name))?;
    let updated = state.backend.update_server(server).await?;
    Ok(SaveResponse::Ok(Json(updated)))
}

/// `PUT /api/dhcp/servers/{name}/status`
pub async fn set_status<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<SaveResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = ServerName::from_str(&name)?;
    let _permit = state.guard.try_acquire(EntityKey::Server(name.clone()))?;
    let updated = state.backend.set_server_enabled(&name, req.enabled).await?;
    Ok(SaveResponse::Ok(Json(updated)))
}

/// `DELETE /api/dhcp/servers/{name}`
pub async fn delete<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = ServerName::from_str(&name)?;
    let _permit = state.guard.try_acquire(EntityKey::Server(name.clone()))?;
    state.backend.delete_server(&name).await?;
    Ok(DeleteResponse::NoContent)
}
