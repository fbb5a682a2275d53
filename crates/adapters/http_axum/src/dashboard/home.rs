//! Dashboard home page: overview of the router configuration.

use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use routerdesk_app::ports::ConfigBackend;
use routerdesk_app::views::Overview;
use routerdesk_domain::service::ServiceKind;

use super::{DashboardError, applied, render};
use crate::state::AppState;

/// Configuration state of one service, as linked from the home page.
pub struct ServiceStatus {
    title: &'static str,
    href: String,
    configured: bool,
}

/// Home page template.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    title: &'static str,
    overview: Overview,
    services: Vec<ServiceStatus>,
}

impl HomeTemplate {
    fn new(overview: Overview) -> Self {
        let services = ServiceKind::ALL
            .into_iter()
            .map(|kind| ServiceStatus {
                title: kind.title(),
                href: format!("/services/{}", kind.as_str()),
                configured: overview.configured.contains(&kind),
            })
            .collect();
        Self {
            title: "Overview",
            overview,
            services,
        }
    }
}

/// `GET /`: configuration overview.
pub async fn index<B>(State(state): State<AppState<B>>) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let session = state.session();
    let overview = applied(Overview::load(&session, &*state.backend).await?)?;
    render(&HomeTemplate::new(overview), StatusCode::OK)
}
