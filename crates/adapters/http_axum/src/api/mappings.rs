//! JSON REST handlers for the static mappings of a DHCP server.

use std::net::Ipv4Addr;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use routerdesk_app::guard::EntityKey;
use routerdesk_app::ports::ConfigBackend;
use routerdesk_domain::dhcp::StaticMapping;
use routerdesk_domain::error::ValidationError;
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::net::MacAddress;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating or replacing a static mapping.
#[derive(Debug, Deserialize)]
pub struct MappingRequest {
    pub id: Option<MappingId>,
    pub mac_address: MacAddress,
    pub ip_address: Ipv4Addr,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<StaticMapping>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create and update endpoints.
pub enum SaveResponse {
    Created(Json<StaticMapping>),
    Ok(Json<StaticMapping>),
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

/// `GET /api/dhcp/servers/{name}/mappings`
pub async fn list<B>(
    State(state): State<AppState<B>>,
    Path(server): Path<String>,
) -> Result<ListResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let server = ServerName::from_str(&server)?;
    let mappings = state.backend.list_mappings(&server).await?;
    Ok(ListResponse::Ok(Json(mappings)))
}

/// `POST /api/dhcp/servers/{name}/mappings`
pub async fn create<B>(
    State(state): State<AppState<B>>,
    Path(server): Path<String>,
    Json(req): Json<MappingRequest>,
) -> Result<SaveResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let server = ServerName::from_str(&server)?;
    let id = req.id.ok_or(ValidationError::MissingField {
        field: MappingId::FIELD,
    })?;
    let mapping = StaticMapping::new(id, req.mac_address, req.ip_address);
    let _permit = state
        .guard
        .try_acquire(EntityKey::Mapping(server.clone(), mapping.id.clone()))?;
    let created = state.backend.create_mapping(&server, mapping).await?;
    Ok(SaveResponse::Created(Json(created)))
}

/// `PUT /api/dhcp/servers/{name}/mappings/{id}`
pub async fn update<B>(
    State(state): State<AppState<B>>,
    Path((server, id)): Path<(String, String)>,
    Json(req): Json<MappingRequest>,
) -> Result<SaveResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let server = ServerName::from_str(&server)?;
    let id = MappingId::from_str(&id)?;
    if req.id.as_ref().is_some_and(|body| body != &id) {
        return Err(ValidationError::InvalidField {
            field: MappingId::FIELD,
            reason: format!("body names a different mapping than {id}"),
        }
        .into());
    }
    let mapping = StaticMapping::new(id.clone(), req.mac_address, req.ip_address);
    let _permit = state
        .guard
        .try_acquire(EntityKey::Mapping(server.clone(), id))?;
    let updated = state.backend.update_mapping(&server, mapping).await?;
    Ok(SaveResponse::Ok(Json(updated)))
}

/// `DELETE /api/dhcp/servers/{name}/mappings/{id}`
pub async fn delete<B>(
    State(state): State<AppState<B>>,
    Path((server, id)): Path<(String, String)>,
) -> Result<DeleteResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let server = ServerName::from_str(&server)?;
    let id = MappingId::from_str(&id)?;
    let _permit = state
        .guard
        .try_acquire(EntityKey::Mapping(server.clone(), id.clone()))?;
    state.backend.delete_mapping(&server, &id).await?;
    Ok(DeleteResponse::NoContent)
}
