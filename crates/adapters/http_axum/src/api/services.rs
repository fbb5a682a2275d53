//! JSON REST handlers for the singleton service settings.
//!
//! Bodies carry the bare configuration of the service named in the path:
//! a forwarding config for `dns` and `blacklist`, a PPPoE config for `pppoe`.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use routerdesk_app::guard::EntityKey;
use routerdesk_app::ports::ConfigBackend;
use routerdesk_domain::error::{NotFoundError, RouterDeskError, ValidationError};
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the get and put endpoints.
pub enum ConfigResponse {
    Ok(Json<Value>),
}

impl IntoResponse for ConfigResponse {
    fn into_response(self) -> Response {
        match self {
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

fn parse_kind(raw: &str) -> Result<ServiceKind, RouterDeskError> {
    ServiceKind::from_str(raw).map_err(|_| {
        NotFoundError {
            entity: "Service",
            id: raw.to_string(),
        }
        .into()
    })
}

fn wrap(kind: ServiceKind, config: Value) -> Result<ServiceSettings, RouterDeskError> {
    let settings = match kind {
        ServiceKind::Dns => serde_json::from_value(config).map(ServiceSettings::Dns),
        ServiceKind::Blacklist => serde_json::from_value(config).map(ServiceSettings::Blacklist),
        ServiceKind::Pppoe => serde_json::from_value(config).map(ServiceSettings::Pppoe),
    };
    settings.map_err(|err| {
        ValidationError::InvalidField {
            field: "config",
            reason: err.to_string(),
        }
        .into()
    })
}

fn unwrap(settings: &ServiceSettings) -> Result<Value, RouterDeskError> {
    let value = match settings {
        ServiceSettings::Dns(config) | ServiceSettings::Blacklist(config) => {
            serde_json::to_value(config)
        }
        ServiceSettings::Pppoe(config) => serde_json::to_value(config),
    };
    value.map_err(|err| RouterDeskError::Transport(Box::new(err)))
}

/// `GET /api/services/{kind}`
pub async fn get<B>(
    State(state): State<AppState<B>>,
    Path(kind): Path<String>,
) -> Result<ConfigResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let kind = parse_kind(&kind)?;
    let Some(settings) = state.backend.get_service(kind).await? else {
        return Err(RouterDeskError::from(NotFoundError {
            entity: "Service",
            id: kind.as_str().to_string(),
        })
        .into());
    };
    Ok(ConfigResponse::Ok(Json(unwrap(&settings)?)))
}

/// `PUT /api/services/{kind}`
pub async fn put<B>(
    State(state): State<AppState<B>>,
    Path(kind): Path<String>,
    Json(config): Json<Value>,
) -> Result<ConfigResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let kind = parse_kind(&kind)?;
    let settings = wrap(kind, config)?;
    let _permit = state.guard.try_acquire(EntityKey::Service(kind))?;
    let stored = state.backend.put_service(settings).await?;
    Ok(ConfigResponse::Ok(Json(unwrap(&stored)?)))
}

/// `DELETE /api/services/{kind}`
pub async fn delete<B>(
    State(state): State<AppState<B>>,
    Path(kind): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let kind = parse_kind(&kind)?;
    let _permit = state.guard.try_acquire(EntityKey::Service(kind))?;
    state.backend.delete_service(kind).await?;
    Ok(DeleteResponse::NoContent)
}
