//! Dashboard pages for DHCP servers: the server table, the create form and
//! the per-server dialog.

use std::str::FromStr;

use askama::Template;
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

use routerdesk_app::guard::MutationGuard;
use routerdesk_app::ports::ConfigBackend;
use routerdesk_app::views::{
    DhcpServerDialog, DhcpServerDraft, DialogTab, Feedback, FormValues, FormView, ServerRow,
    SubmitOutcome, TableView, ViewSession,
};
use routerdesk_domain::dhcp::PoolStats;
use routerdesk_domain::id::ServerName;

use super::view::{FormSection, TableSection, dialog_href};
use super::{
    ConfirmTemplate, DashboardError, FormPageTemplate, applied, redirect, refresh_href, render,
    rejected_status,
};
use crate::error::status_of;
use crate::state::AppState;

/// DHCP server table page.
#[derive(Template)]
#[template(path = "dhcp_list.html")]
pub struct DhcpListTemplate {
    title: &'static str,
    table: TableSection,
    message: Option<String>,
}

/// Link to one tab of the server dialog.
pub struct TabLink {
    title: &'static str,
    href: String,
    active: bool,
}

/// Per-server dialog page; only the selected tab's content is rendered.
#[derive(Template)]
#[template(path = "dhcp_dialog.html")]
pub struct DhcpDialogTemplate {
    title: String,
    subnet: String,
    enabled: bool,
    stats: PoolStats,
    tabs: Vec<TabLink>,
    tab: &'static str,
    new_mapping: Option<String>,
    table: Option<TableSection>,
    form: Option<FormSection>,
}

impl DhcpDialogTemplate {
    pub(crate) fn new(dialog: &DhcpServerDialog, guard: &MutationGuard) -> Self {
        let server = &dialog.summary().server;
        let tab = dialog.tab();
        Self {
            title: format!("DHCP Server {}", server.name),
            subnet: server.subnet.to_string(),
            enabled: server.enabled,
            stats: dialog.stats(),
            tabs: DialogTab::ALL
                .into_iter()
                .map(|other| TabLink {
                    title: other.title(),
                    href: dialog_href(&server.name, other.as_str()),
                    active: other == tab,
                })
                .collect(),
            tab: tab.as_str(),
            new_mapping: (tab == DialogTab::Mappings && !dialog.is_read_only())
                .then(|| format!("/dhcp/{}/mappings/new", server.name)),
            table: match tab {
                DialogTab::Leases => Some(TableSection::new(dialog.leases(), guard)),
                DialogTab::Mappings => Some(TableSection::new(dialog.mappings(), guard)),
                DialogTab::Details => None,
            },
            form: (tab == DialogTab::Details).then(|| {
                FormSection::new(
                    dialog.details(),
                    &(),
                    format!("/dhcp/{}/details", server.name),
                    dialog_href(&server.name, tab.as_str()),
                )
            }),
        }
    }
}

/// Query string of the server table.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: String,
}

/// Query string of the server dialog.
#[derive(Debug, Default, Deserialize)]
pub struct DialogQuery {
    pub tab: Option<String>,
}

pub(crate) fn parse_name(raw: &str) -> Result<ServerName, DashboardError> {
    Ok(ServerName::from_str(raw)?)
}

/// Open the dialog of `name` on `tab`.
pub(crate) async fn open_dialog<B>(
    state: &AppState<B>,
    session: &ViewSession,
    name: &ServerName,
    tab: DialogTab,
) -> Result<DhcpServerDialog, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    applied(DhcpServerDialog::open(session, &*state.backend, name, tab).await?)
}

fn list_page(
    table: &TableView<ServerRow>,
    guard: &MutationGuard,
    message: Option<String>,
) -> DhcpListTemplate {
    DhcpListTemplate {
        title: "DHCP Server",
        table: TableSection::new(table, guard),
        message,
    }
}

async fn load_table<B>(
    state: &AppState<B>,
    session: &ViewSession,
) -> Result<TableView<ServerRow>, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    applied(TableView::load(session, &*state.backend, &()).await)
}

fn create_page(form: &FormView<DhcpServerDraft>) -> FormPageTemplate {
    FormPageTemplate {
        title: "Create New DHCP Server".to_string(),
        form: FormSection::new(form, &(), "/dhcp/new".to_string(), "/dhcp".to_string()),
    }
}

/// `GET /dhcp`: server table, optionally filtered.
pub async fn list<B>(
    State(state): State<AppState<B>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let session = state.session();
    let mut table = load_table(&state, &session).await?;
    table.set_filter(query.filter);
    render(&list_page(&table, &state.guard, None), StatusCode::OK)
}

/// `GET /dhcp/new`: empty create form.
pub async fn new() -> Result<Response, DashboardError> {
    render(&create_page(&FormView::create(&())), StatusCode::OK)
}

/// `POST /dhcp/new`: create a server (PRG).
pub async fn create<B>(
    State(state): State<AppState<B>>,
    Form(input): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let session = state.session();
    let mut form = FormView::<DhcpServerDraft>::create(&());
    form.accept(FormValues::from_pairs(input));
    match form.submit(&session, &*state.backend, &()).await {
        SubmitOutcome::Saved { refresh, .. } => Ok(redirect(&refresh_href(&refresh))),
        SubmitOutcome::Rejected => render(&create_page(&form), rejected_status(&form)),
        SubmitOutcome::Discarded => Err(DashboardError::Stale),
    }
}

/// `GET /dhcp/{name}?tab=`: server dialog.
pub async fn dialog<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Query(query): Query<DialogQuery>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let tab = match query.tab.as_deref() {
        Some(raw) => DialogTab::from_str(raw)?,
        None => DialogTab::Leases,
    };
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, tab).await?;
    render(&DhcpDialogTemplate::new(&dialog, &state.guard), StatusCode::OK)
}

/// `POST /dhcp/{name}/details`: save the details tab (PRG).
pub async fn update<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Form(input): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let session = state.session();
    let mut dialog = open_dialog(&state, &session, &name, DialogTab::Details).await?;
    dialog.details_mut().accept(FormValues::from_pairs(input));
    match dialog
        .details_mut()
        .submit(&session, &*state.backend, &())
        .await
    {
        SubmitOutcome::Saved { refresh, .. } => Ok(redirect(&refresh_href(&refresh))),
        SubmitOutcome::Rejected => {
            let status = rejected_status(dialog.details());
            render(&DhcpDialogTemplate::new(&dialog, &state.guard), status)
        }
        SubmitOutcome::Discarded => Err(DashboardError::Stale),
    }
}

/// `POST /dhcp/{name}/status`: enable or disable a server.
pub async fn toggle_status<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let session = state.session();
    let row = ServerRow {
        summary: state.backend.get_server(&name).await?,
    };
    match row.toggle_status(&session, &*state.backend).await {
        Ok(updated) => {
            applied(updated)?;
            Ok(redirect("/dhcp"))
        }
        Err(err) => {
            let table = load_table(&state, &session).await?;
            let message = Feedback::from_error(&err).message().to_string();
            render(
                &list_page(&table, &state.guard, Some(message)),
                status_of(&err),
            )
        }
    }
}

/// `GET /dhcp/{name}/delete`: confirmation page.
pub async fn confirm_delete<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    state.backend.get_server(&name).await?;
    let page = ConfirmTemplate {
        title: "Delete DHCP Server".to_string(),
        prompt: format!(
            "Delete DHCP server {name}? Its static mappings and leases are removed too."
        ),
        action: format!("/dhcp/{name}/delete"),
        cancel: "/dhcp".to_string(),
    };
    render(&page, StatusCode::OK)
}

/// `POST /dhcp/{name}/delete`: delete after confirmation (PRG).
pub async fn delete<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let session = state.session();
    let mut table = load_table(&state, &session).await?;
    if let Some(failure) = table.failure() {
        let message = failure.to_string();
        return render(
            &list_page(&table, &state.guard, Some(message)),
            StatusCode::SERVICE_UNAVAILABLE,
        );
    }
    if table.request_delete(name).is_err() {
        // already gone
        return Ok(redirect("/dhcp"));
    }
    match table.confirm_delete(&session, &*state.backend).await {
        Ok(done) => {
            applied(done)?;
            Ok(redirect("/dhcp"))
        }
        Err(err) => render(&list_page(&table, &state.guard, None), status_of(&err)),
    }
}
