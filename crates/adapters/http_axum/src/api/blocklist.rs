//! JSON REST handlers for the networks blocked by the DNS blacklist.
//!
//! `PUT` takes a threat feed as plain text and answers with what changed.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use ipnetwork::Ipv4Network;

use routerdesk_app::guard::EntityKey;
use routerdesk_app::ports::ConfigBackend;
use routerdesk_domain::blocklist::NetworkDiff;
use routerdesk_domain::service::ServiceKind;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Ipv4Network>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the replace endpoint.
pub enum ReplaceResponse {
    Ok(Json<NetworkDiff>),
}

impl IntoResponse for ReplaceResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/blacklist/networks`
pub async fn list<B>(State(state): State<AppState<B>>) -> Result<ListResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let networks = state.backend.list_blocked_networks().await?;
    Ok(ListResponse::Ok(Json(networks)))
}

/// `PUT /api/blacklist/networks`
pub async fn replace<B>(
    State(state): State<AppState<B>>,
    feed: String,
) -> Result<ReplaceResponse, ApiError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let _permit = state
        .guard
        .try_acquire(EntityKey::Service(ServiceKind::Blacklist))?;
    let diff = state.backend.update_blocked_networks(&feed).await?;
    Ok(ReplaceResponse::Ok(Json(diff)))
}
