//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use routerdesk_domain::error::{BusyError, RouterDeskError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

/// Status code of a backend error.
pub(crate) fn status_of(err: &RouterDeskError) -> StatusCode {
    match err {
        RouterDeskError::Validation(_) => StatusCode::BAD_REQUEST,
        RouterDeskError::NotFound(_) => StatusCode::NOT_FOUND,
        RouterDeskError::Conflict(_) | RouterDeskError::Busy(_) => StatusCode::CONFLICT,
        RouterDeskError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Maps [`RouterDeskError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(RouterDeskError);

impl From<RouterDeskError> for ApiError {
    fn from(err: RouterDeskError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<BusyError> for ApiError {
    fn from(err: BusyError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        let error = match &self.0 {
            RouterDeskError::Transport(source) => {
                tracing::error!(error = %source, "backend unavailable");
                self.0.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error,
            field: self.0.field(),
        };
        (status, Json(body)).into_response()
    }
}
