//! Dashboard pages for static mappings: create, edit and delete, and the
//! "map static IP" shortcut from a lease.

use std::net::Ipv4Addr;
use std::str::FromStr;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use routerdesk_app::ports::ConfigBackend;
use routerdesk_app::views::{
    DhcpServerDialog, DialogTab, FormValues, FormView, StaticMappingDraft, SubmitOutcome,
    ViewSession,
};
use routerdesk_domain::error::{NotFoundError, RouterDeskError, ValidationError};
use routerdesk_domain::id::{MappingId, ServerName};

use super::dhcp::{DhcpDialogTemplate, open_dialog, parse_name};
use super::view::{FormSection, dialog_href, map_static_href, mapping_href};
use super::{
    ConfirmTemplate, DashboardError, FormPageTemplate, applied, redirect, refresh_href, render,
    rejected_status,
};
use crate::error::status_of;
use crate::state::AppState;

fn read_only(server: &ServerName) -> DashboardError {
    RouterDeskError::from(ValidationError::InvalidField {
        field: ServerName::FIELD,
        reason: format!("static mappings of {server} are read-only while it is disabled"),
    })
    .into()
}

fn parse_id(raw: &str) -> Result<MappingId, DashboardError> {
    Ok(MappingId::from_str(raw)?)
}

fn parse_ip(raw: &str) -> Result<Ipv4Addr, DashboardError> {
    Ok(routerdesk_domain::net::parse_ipv4("ipaddress", raw)?)
}

fn form_page(
    title: &str,
    form: &FormView<StaticMappingDraft>,
    server: &ServerName,
    action: String,
) -> FormPageTemplate {
    FormPageTemplate {
        title: format!("{title} ({server})"),
        form: FormSection::new(form, server, action, dialog_href(server, "mappings")),
    }
}

/// Store the submitted mapping and go back to the mappings tab.
async fn submit<B>(
    state: &AppState<B>,
    session: &ViewSession,
    mut form: FormView<StaticMappingDraft>,
    server: &ServerName,
    title: &str,
    action: String,
    input: Vec<(String, String)>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    form.accept(FormValues::from_pairs(input));
    match form.submit(session, &*state.backend, server).await {
        SubmitOutcome::Saved { refresh, .. } => Ok(redirect(&refresh_href(&refresh))),
        SubmitOutcome::Rejected => {
            render(&form_page(title, &form, server, action), rejected_status(&form))
        }
        SubmitOutcome::Discarded => Err(DashboardError::Stale),
    }
}

fn editable_mapping(
    dialog: &DhcpServerDialog,
    server: &ServerName,
    id: &MappingId,
) -> Result<FormView<StaticMappingDraft>, DashboardError> {
    if dialog.is_read_only() {
        return Err(read_only(server));
    }
    dialog.edit_mapping(id).ok_or_else(|| {
        RouterDeskError::from(NotFoundError {
            entity: "StaticMapping",
            id: id.to_string(),
        })
        .into()
    })
}

/// `GET /dhcp/{name}/mappings/new`
pub async fn new<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, DialogTab::Mappings).await?;
    let form = dialog.mapping_form().ok_or_else(|| read_only(&name))?;
    let action = format!("/dhcp/{name}/mappings/new");
    render(
        &form_page("Create New Static Mapping", &form, &name, action),
        StatusCode::OK,
    )
}

/// `POST /dhcp/{name}/mappings/new`: create a mapping (PRG).
pub async fn create<B>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Form(input): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, DialogTab::Mappings).await?;
    let form = dialog.mapping_form().ok_or_else(|| read_only(&name))?;
    let action = format!("/dhcp/{name}/mappings/new");
    submit(
        &state,
        &session,
        form,
        &name,
        "Create New Static Mapping",
        action,
        input,
    )
    .await
}

/// `GET /dhcp/{name}/mappings/{id}/edit`
pub async fn edit<B>(
    State(state): State<AppState<B>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let id = parse_id(&id)?;
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, DialogTab::Mappings).await?;
    let form = editable_mapping(&dialog, &name, &id)?;
    let action = mapping_href(&name, &id, "edit");
    render(
        &form_page("Edit Static Mapping", &form, &name, action),
        StatusCode::OK,
    )
}

/// `POST /dhcp/{name}/mappings/{id}/edit`: update a mapping (PRG).
pub async fn update<B>(
    State(state): State<AppState<B>>,
    Path((name, id)): Path<(String, String)>,
    Form(input): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let id = parse_id(&id)?;
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, DialogTab::Mappings).await?;
    let form = editable_mapping(&dialog, &name, &id)?;
    let action = mapping_href(&name, &id, "edit");
    submit(
        &state,
        &session,
        form,
        &name,
        "Edit Static Mapping",
        action,
        input,
    )
    .await
}

/// `GET /dhcp/{name}/mappings/{id}/delete`: confirmation page.
pub async fn confirm_delete<B>(
    State(state): State<AppState<B>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let id = parse_id(&id)?;
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, DialogTab::Mappings).await?;
    editable_mapping(&dialog, &name, &id)?;
    let page = ConfirmTemplate {
        title: "Delete Static Mapping".to_string(),
        prompt: format!("Delete static mapping {id} of {name}?"),
        action: mapping_href(&name, &id, "delete"),
        cancel: dialog_href(&name, "mappings"),
    };
    render(&page, StatusCode::OK)
}

/// `POST /dhcp/{name}/mappings/{id}/delete`: delete after confirmation (PRG).
pub async fn delete<B>(
    State(state): State<AppState<B>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let id = parse_id(&id)?;
    let session = state.session();
    let mut dialog = open_dialog(&state, &session, &name, DialogTab::Mappings).await?;
    if dialog.is_read_only() {
        return Err(read_only(&name));
    }
    let back = dialog_href(&name, "mappings");
    if let Some(failure) = dialog.mappings().failure() {
        let status = StatusCode::SERVICE_UNAVAILABLE;
        tracing::warn!(server = %name, error = failure, "mapping table unavailable");
        return render(&DhcpDialogTemplate::new(&dialog, &state.guard), status);
    }
    if dialog.mappings_mut().request_delete(id).is_err() {
        // already gone
        return Ok(redirect(&back));
    }
    match dialog
        .mappings_mut()
        .confirm_delete(&session, &*state.backend)
        .await
    {
        Ok(done) => {
            applied(done)?;
            Ok(redirect(&back))
        }
        Err(err) => render(
            &DhcpDialogTemplate::new(&dialog, &state.guard),
            status_of(&err),
        ),
    }
}

/// `GET /dhcp/{name}/leases/{ip}/map-static`: mapping form pre-filled from
/// a lease, with the MAC address locked.
pub async fn map_static<B>(
    State(state): State<AppState<B>>,
    Path((name, ip)): Path<(String, String)>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let ip = parse_ip(&ip)?;
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, DialogTab::Leases).await?;
    let form = dialog.map_static(ip)?;
    render(
        &form_page("Map Static IP", &form, &name, map_static_href(&name, ip)),
        StatusCode::OK,
    )
}

/// `POST /dhcp/{name}/leases/{ip}/map-static`: promote a lease (PRG).
pub async fn create_from_lease<B>(
    State(state): State<AppState<B>>,
    Path((name, ip)): Path<(String, String)>,
    Form(input): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let name = parse_name(&name)?;
    let ip = parse_ip(&ip)?;
    let session = state.session();
    let dialog = open_dialog(&state, &session, &name, DialogTab::Leases).await?;
    let form = dialog.map_static(ip)?;
    submit(
        &state,
        &session,
        form,
        &name,
        "Map Static IP",
        map_static_href(&name, ip),
        input,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::build;
    use crate::testing::{MemoryBackend, get, lan0, lease, post_form, send, state};
    use routerdesk_domain::dhcp::StaticMapping;

    fn lan0_name() -> ServerName {
        ServerName::new("lan0").unwrap()
    }

    async fn seeded() -> AppState<MemoryBackend> {
        let state = state();
        state.backend.create_server(lan0()).await.unwrap();
        state
            .backend
            .create_mapping(
                &lan0_name(),
                StaticMapping::new(
                    MappingId::new("nas").unwrap(),
                    "00:11:22:33:44:55".parse().unwrap(),
                    Ipv4Addr::new(192, 0, 2, 20),
                ),
            )
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn should_create_mapping_and_return_to_mappings_tab() {
        let state = seeded().await;
        let form = "id=printer&macaddress=00%3A11%3A22%3A33%3A44%3A66&ipaddress=192.0.2.21";
        let page = send(
            build(state.clone()),
            post_form("/dhcp/lan0/mappings/new", form),
        )
        .await;
        assert_eq!(page.status, StatusCode::SEE_OTHER);
        assert_eq!(page.location.as_deref(), Some("/dhcp/lan0?tab=mappings"));
        assert_eq!(
            state.backend.list_mappings(&lan0_name()).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn should_reject_duplicate_mac_on_its_field() {
        let state = seeded().await;
        let form = "id=nas2&macaddress=00%3A11%3A22%3A33%3A44%3A55&ipaddress=192.0.2.21";
        let page = send(
            build(state.clone()),
            post_form("/dhcp/lan0/mappings/new", form),
        )
        .await;
        assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(page.html.contains("StaticMapping with macaddress"));
        assert_eq!(
            state.backend.list_mappings(&lan0_name()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn should_refuse_mapping_form_for_disabled_server() {
        let state = seeded().await;
        state
            .backend
            .set_server_enabled(&lan0_name(), false)
            .await
            .unwrap();
        let page = send(build(state.clone()), get("/dhcp/lan0/mappings/new")).await;
        assert_eq!(page.status, StatusCode::BAD_REQUEST);
        let page = send(build(state), get("/dhcp/lan0?tab=mappings")).await;
        assert!(!page.html.contains("Create New Static Mapping"));
        assert!(page.html.contains("<td>nas</td>"));
    }

    #[tokio::test]
    async fn should_update_mapping_with_locked_id() {
        let state = seeded().await;
        let form = "id=renamed&macaddress=00%3A11%3A22%3A33%3A44%3A55&ipaddress=192.0.2.30";
        let page = send(
            build(state.clone()),
            post_form("/dhcp/lan0/mappings/nas/edit", form),
        )
        .await;
        assert_eq!(page.status, StatusCode::SEE_OTHER);
        let mappings = state.backend.list_mappings(&lan0_name()).await.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].id.as_str(), "nas");
        assert_eq!(mappings[0].ip_address, Ipv4Addr::new(192, 0, 2, 30));
    }

    #[tokio::test]
    async fn should_return_404_when_editing_unknown_mapping() {
        let state = seeded().await;
        let page = send(build(state), get("/dhcp/lan0/mappings/ghost/edit")).await;
        assert_eq!(page.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_delete_mapping_after_confirmation() {
        let state = seeded().await;
        let page = send(build(state.clone()), get("/dhcp/lan0/mappings/nas/delete")).await;
        assert!(page.html.contains("Delete static mapping nas of lan0?"));

        let page = send(
            build(state.clone()),
            post_form("/dhcp/lan0/mappings/nas/delete", ""),
        )
        .await;
        assert_eq!(page.location.as_deref(), Some("/dhcp/lan0?tab=mappings"));
        assert!(state.backend.list_mappings(&lan0_name()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_prefill_map_static_form_from_lease() {
        let state = seeded().await;
        state
            .backend
            .record_lease(lease(42, "00:11:22:33:44:42", Some("laptop")))
            .await
            .unwrap();

        let page = send(
            build(state.clone()),
            get("/dhcp/lan0/leases/192.0.2.42/map-static"),
        )
        .await;
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.html.contains("value=\"laptop\""));
        assert!(page.html.contains("readonly"));

        let form = "id=laptop&macaddress=ff%3Aff%3Aff%3Aff%3Aff%3Aff&ipaddress=192.0.2.42";
        let page = send(
            build(state.clone()),
            post_form("/dhcp/lan0/leases/192.0.2.42/map-static", form),
        )
        .await;
        assert_eq!(page.status, StatusCode::SEE_OTHER);
        let mappings = state.backend.list_mappings(&lan0_name()).await.unwrap();
        let laptop = mappings.iter().find(|m| m.id.as_str() == "laptop").unwrap();
        assert_eq!(laptop.mac_address.to_string(), "00:11:22:33:44:42");
    }

    #[tokio::test]
    async fn should_return_404_when_lease_unknown() {
        let state = seeded().await;
        let page = send(build(state), get("/dhcp/lan0/leases/192.0.2.99/map-static")).await;
        assert_eq!(page.status, StatusCode::NOT_FOUND);
    }
}
