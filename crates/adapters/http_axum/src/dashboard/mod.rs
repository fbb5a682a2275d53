//! Server-side rendered HTML dashboard (no JavaScript).

pub mod dhcp;
pub mod home;
pub mod mappings;
pub mod services;
pub mod view;

use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};

use routerdesk_app::ports::ConfigBackend;
use routerdesk_app::views::{Applied, FormDraft, FormView, Refresh};
use routerdesk_domain::error::{RouterDeskError, ValidationError};

use crate::error::status_of;
use crate::state::AppState;

/// Build the dashboard sub-router for SSR HTML pages.
pub fn routes<B>() -> Router<AppState<B>>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(home::index::<B>))
        // DHCP servers
        .route("/dhcp", get(dhcp::list::<B>))
        .route("/dhcp/new", get(dhcp::new).post(dhcp::create::<B>))
        .route("/dhcp/{name}", get(dhcp::dialog::<B>))
        .route("/dhcp/{name}/details", post(dhcp::update::<B>))
        .route("/dhcp/{name}/status", post(dhcp::toggle_status::<B>))
        .route(
            "/dhcp/{name}/delete",
            get(dhcp::confirm_delete::<B>).post(dhcp::delete::<B>),
        )
        // Static mappings
        .route(
            "/dhcp/{name}/mappings/new",
            get(mappings::new::<B>).post(mappings::create::<B>),
        )
        .route(
            "/dhcp/{name}/mappings/{id}/edit",
            get(mappings::edit::<B>).post(mappings::update::<B>),
        )
        .route(
            "/dhcp/{name}/mappings/{id}/delete",
            get(mappings::confirm_delete::<B>).post(mappings::delete::<B>),
        )
        .route(
            "/dhcp/{name}/leases/{ip}/map-static",
            get(mappings::map_static::<B>).post(mappings::create_from_lease::<B>),
        )
        // Services
        .route(
            "/services/{kind}",
            get(services::show::<B>).post(services::save::<B>),
        )
        .route(
            "/services/{kind}/delete",
            get(services::confirm_delete).post(services::delete::<B>),
        )
}

/// Failure of a dashboard page, rendered as an HTML error page.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Backend(#[from] RouterDeskError),
    #[error("the page changed while it was loading, reload it")]
    Stale,
    #[error("failed to render page")]
    Render(#[from] askama::Error),
}

impl From<ValidationError> for DashboardError {
    fn from(err: ValidationError) -> Self {
        Self::Backend(err.into())
    }
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    title: String,
    message: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Backend(err) => status_of(err),
            Self::Stale => StatusCode::CONFLICT,
            Self::Render(err) => {
                tracing::error!(error = %err, "failed to render dashboard page");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let page = ErrorTemplate {
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            message: match &self {
                Self::Backend(err) => {
                    routerdesk_app::views::Feedback::from_error(err)
                        .message()
                        .to_string()
                }
                other => other.to_string(),
            },
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, page.message).into_response(),
        }
    }
}

/// Render `template` with `status`.
pub(crate) fn render<T: Template>(template: &T, status: StatusCode) -> Result<Response, DashboardError> {
    Ok((status, Html(template.render()?)).into_response())
}

/// Unwrap a view response; a request never outlives its own session.
pub(crate) fn applied<T>(applied: Applied<T>) -> Result<T, DashboardError> {
    applied.into_option().ok_or(DashboardError::Stale)
}

/// Page showing the table a successful save refreshes.
pub(crate) fn refresh_href(refresh: &Refresh) -> String {
    match refresh {
        Refresh::Servers => "/dhcp".to_string(),
        Refresh::Mappings(server) => view::dialog_href(server, "mappings"),
        Refresh::Service(kind) => format!("/services/{}", kind.as_str()),
    }
}

pub(crate) fn redirect(href: &str) -> Response {
    Redirect::to(href).into_response()
}

/// Status of a form kept open after a submit.
pub(crate) fn rejected_status<D: FormDraft>(form: &FormView<D>) -> StatusCode {
    if form.banner().is_some() {
        StatusCode::SERVICE_UNAVAILABLE
    } else if form.message().is_some() {
        StatusCode::CONFLICT
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

/// Standalone form page.
#[derive(Template)]
#[template(path = "form_page.html")]
pub struct FormPageTemplate {
    title: String,
    form: view::FormSection,
}

/// Delete confirmation page.
#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    title: String,
    prompt: String,
    action: String,
    cancel: String,
}
