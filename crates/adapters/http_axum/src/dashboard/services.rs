//! Dashboard pages for the DNS forwarding, DNS blacklist and PPPoE settings.

use std::str::FromStr;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use routerdesk_app::ports::ConfigBackend;
use routerdesk_app::views::{
    FormDraft, FormMode, FormValues, FormView, Forwarder, ForwardingDraft, ForwardingScope,
    PppoeDraft, PppoeScope, SubmitOutcome, delete_service,
};
use routerdesk_domain::error::{NotFoundError, RouterDeskError};
use routerdesk_domain::service::ServiceKind;

use super::view::FormSection;
use super::{
    ConfirmTemplate, DashboardError, FormPageTemplate, redirect, refresh_href, render,
    rejected_status,
};
use crate::state::AppState;

fn parse_kind(raw: &str) -> Result<ServiceKind, DashboardError> {
    ServiceKind::from_str(raw).map_err(|_| {
        RouterDeskError::from(NotFoundError {
            entity: "Service",
            id: raw.to_string(),
        })
        .into()
    })
}

fn href(kind: ServiceKind) -> String {
    format!("/services/{}", kind.as_str())
}

fn forwarding_scope<B>(state: &AppState<B>, forwarder: Forwarder) -> ForwardingScope {
    ForwardingScope {
        forwarder,
        known: state.interfaces.to_vec(),
    }
}

fn pppoe_scope<B>(state: &AppState<B>) -> PppoeScope {
    PppoeScope {
        known: state.interfaces.to_vec(),
    }
}

fn page<D: FormDraft>(kind: ServiceKind, form: &FormView<D>, scope: &D::Scope) -> FormPageTemplate {
    // cancel reloads the stored settings, which resets the form
    let section = FormSection::new(form, scope, href(kind), href(kind));
    FormPageTemplate {
        title: kind.title().to_string(),
        form: match form.mode() {
            FormMode::Edit => section.with_delete(format!("{}/delete", href(kind))),
            FormMode::Create => section,
        },
    }
}

async fn submit<B, D>(
    state: &AppState<B>,
    kind: ServiceKind,
    mut form: FormView<D>,
    scope: &D::Scope,
    input: Vec<(String, String)>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
    D: FormDraft,
{
    let session = state.session();
    form.accept(FormValues::from_pairs(input));
    match form.submit(&session, &*state.backend, scope).await {
        SubmitOutcome::Saved { refresh, .. } => Ok(redirect(&refresh_href(&refresh))),
        SubmitOutcome::Rejected => render(&page(kind, &form, scope), rejected_status(&form)),
        SubmitOutcome::Discarded => Err(DashboardError::Stale),
    }
}

/// `GET /services/{kind}`: settings form, pre-filled when configured.
pub async fn show<B>(
    State(state): State<AppState<B>>,
    Path(kind): Path<String>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let kind = parse_kind(&kind)?;
    let backend = &*state.backend;
    match kind {
        ServiceKind::Dns | ServiceKind::Blacklist => {
            let forwarder = if kind == ServiceKind::Dns {
                Forwarder::Dns
            } else {
                Forwarder::Blacklist
            };
            let scope = forwarding_scope(&state, forwarder);
            let form = ForwardingDraft::load_form(backend, &scope).await?;
            render(&page(kind, &form, &scope), StatusCode::OK)
        }
        ServiceKind::Pppoe => {
            let scope = pppoe_scope(&state);
            let form = PppoeDraft::load_form(backend, &scope).await?;
            render(&page(kind, &form, &scope), StatusCode::OK)
        }
    }
}

/// `POST /services/{kind}`: save the settings (PRG).
pub async fn save<B>(
    State(state): State<AppState<B>>,
    Path(kind): Path<String>,
    Form(input): Form<Vec<(String, String)>>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let kind = parse_kind(&kind)?;
    let backend = &*state.backend;
    match kind {
        ServiceKind::Dns | ServiceKind::Blacklist => {
            let forwarder = if kind == ServiceKind::Dns {
                Forwarder::Dns
            } else {
                Forwarder::Blacklist
            };
            let scope = forwarding_scope(&state, forwarder);
            let form = ForwardingDraft::load_form(backend, &scope).await?;
            submit(&state, kind, form, &scope, input).await
        }
        ServiceKind::Pppoe => {
            let scope = pppoe_scope(&state);
            let form = PppoeDraft::load_form(backend, &scope).await?;
            submit(&state, kind, form, &scope, input).await
        }
    }
}

/// `GET /services/{kind}/delete`: confirmation page.
pub async fn confirm_delete(Path(kind): Path<String>) -> Result<Response, DashboardError> {
    let kind = parse_kind(&kind)?;
    let page = ConfirmTemplate {
        title: format!("Delete {}", kind.title()),
        prompt: format!("Delete the {} settings?", kind.title()),
        action: format!("{}/delete", href(kind)),
        cancel: href(kind),
    };
    render(&page, StatusCode::OK)
}

/// `POST /services/{kind}/delete`: remove the settings (PRG).
pub async fn delete<B>(
    State(state): State<AppState<B>>,
    Path(kind): Path<String>,
) -> Result<Response, DashboardError>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    let kind = parse_kind(&kind)?;
    let session = state.session();
    delete_service(&session, &*state.backend, kind).await?;
    Ok(redirect(&href(kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::build;
    use crate::testing::{get, post_form, send, state};
    use routerdesk_app::guard::EntityKey;
    use routerdesk_domain::forwarding::InterfaceSelection;
    use routerdesk_domain::service::ServiceSettings;

    #[tokio::test]
    async fn should_render_empty_form_with_known_interfaces() {
        let page = send(build(state()), get("/services/dns")).await;
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.html.contains("DNS Forwarding"));
        assert!(page.html.contains("value=\"150\""));
        assert!(page.html.contains("switch0"));
        assert!(!page.html.contains(">Delete<"));
    }

    #[tokio::test]
    async fn should_save_forwarding_settings_with_other_interface() {
        let state = state();
        let form = "cache-size=300&interface=eth0&other-interface=wg0";
        let page = send(build(state.clone()), post_form("/services/blacklist", form)).await;
        assert_eq!(page.status, StatusCode::SEE_OTHER);
        assert_eq!(page.location.as_deref(), Some("/services/blacklist"));

        let Some(ServiceSettings::Blacklist(config)) = state
            .backend
            .get_service(ServiceKind::Blacklist)
            .await
            .unwrap()
        else {
            panic!("blacklist settings not stored");
        };
        assert_eq!(config.cache_size, 300);
        assert!(config
            .interfaces
            .contains(&InterfaceSelection::Other("wg0".to_string())));
        assert!(config
            .interfaces
            .contains(&InterfaceSelection::Known("eth0".to_string())));

        let page = send(build(state), get("/services/blacklist")).await;
        assert!(page.html.contains(">Delete<"));
    }

    #[tokio::test]
    async fn should_require_an_interface() {
        let state = state();
        let page = send(build(state.clone()), post_form("/services/dns", "cache-size=150")).await;
        assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(page.html.contains("Interface is required"));
        assert!(state
            .backend
            .get_service(ServiceKind::Dns)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn should_reject_pppoe_range_across_subnets() {
        let form = "client-ip-start=192.0.2.1&client-ip-stop=192.0.3.1\
            &radius-server-ip=192.0.2.250&radius-server-key=secret&interface=eth1";
        let page = send(build(state()), post_form("/services/pppoe", form)).await;
        assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(page.html.contains("must stay within one"));
    }

    #[tokio::test]
    async fn should_delete_settings_after_confirmation() {
        let state = state();
        let form = "cache-size=150&interface=eth0";
        send(build(state.clone()), post_form("/services/dns", form)).await;

        let page = send(build(state.clone()), get("/services/dns/delete")).await;
        assert!(page.html.contains("Delete the DNS Forwarding settings?"));

        let page = send(build(state.clone()), post_form("/services/dns/delete", "")).await;
        assert_eq!(page.location.as_deref(), Some("/services/dns"));
        assert!(state
            .backend
            .get_service(ServiceKind::Dns)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn should_reject_delete_while_save_in_flight() {
        let state = state();
        let _permit = state
            .guard
            .try_acquire(EntityKey::Service(ServiceKind::Pppoe))
            .unwrap();
        let page = send(build(state), post_form("/services/pppoe/delete", "")).await;
        assert_eq!(page.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_service_page() {
        let page = send(build(state()), get("/services/ntp")).await;
        assert_eq!(page.status, StatusCode::NOT_FOUND);
    }
}
