//! Typed view models bound by the templates.
//!
//! Templates never look values up by name: every table, row, action and
//! input is turned into one of these structs by an explicit constructor.

use std::net::Ipv4Addr;

use routerdesk_app::guard::{EntityKey, MutationGuard};
use routerdesk_app::views::{
    FieldKind, FormDraft, FormView, LeaseRow, MappingRow, RowAction, ServerRow, TableRow,
    TableView,
};
use routerdesk_domain::id::{MappingId, ServerName};

/// URL of the DHCP server dialog on `tab`.
pub(crate) fn dialog_href(server: &ServerName, tab: &str) -> String {
    format!("/dhcp/{server}?tab={tab}")
}

pub(crate) fn mapping_href(server: &ServerName, id: &MappingId, action: &str) -> String {
    format!("/dhcp/{server}/mappings/{id}/{action}")
}

pub(crate) fn map_static_href(server: &ServerName, ip: Ipv4Addr) -> String {
    format!("/dhcp/{server}/leases/{ip}/map-static")
}

/// How a row links its actions.
pub(crate) trait RowLinks: TableRow {
    fn href(&self, action: RowAction) -> String;

    /// Entity whose in-flight mutation disables the row's mutating actions.
    fn busy_key(&self) -> Option<EntityKey>;
}

impl RowLinks for ServerRow {
    fn href(&self, action: RowAction) -> String {
        let name = &self.server().name;
        match action {
            RowAction::ViewLeases => dialog_href(name, "leases"),
            RowAction::ConfigureStaticMap | RowAction::ViewStaticMap => {
                dialog_href(name, "mappings")
            }
            RowAction::Delete => format!("/dhcp/{name}/delete"),
            RowAction::ToggleStatus { .. } => format!("/dhcp/{name}/status"),
            RowAction::ViewDetails | RowAction::Config | RowAction::MapToStatic => {
                dialog_href(name, "details")
            }
        }
    }

    fn busy_key(&self) -> Option<EntityKey> {
        Some(EntityKey::Server(self.key()))
    }
}

impl RowLinks for MappingRow {
    fn href(&self, action: RowAction) -> String {
        match action {
            RowAction::Delete => mapping_href(&self.server, &self.mapping.id, "delete"),
            _ => mapping_href(&self.server, &self.mapping.id, "edit"),
        }
    }

    fn busy_key(&self) -> Option<EntityKey> {
        Some(EntityKey::Mapping(self.server.clone(), self.key()))
    }
}

impl RowLinks for LeaseRow {
    fn href(&self, _action: RowAction) -> String {
        map_static_href(&self.lease.pool, self.lease.ip_address)
    }

    fn busy_key(&self) -> Option<EntityKey> {
        None
    }
}

/// One entry of a row's action menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView {
    pub label: &'static str,
    pub slug: &'static str,
    pub href: String,
    /// Rendered as a form button instead of a link.
    pub post: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub cells: Vec<String>,
    pub actions: Vec<ActionView>,
    pub error: Option<String>,
}

/// A rendered entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSection {
    pub columns: &'static [&'static str],
    pub rows: Vec<RowView>,
    pub failure: Option<String>,
    pub filter: String,
}

impl TableSection {
    pub(crate) fn new<R: RowLinks>(table: &TableView<R>, guard: &MutationGuard) -> Self {
        let rows = table
            .visible_rows()
            .into_iter()
            .map(|row| {
                let busy = row
                    .busy_key()
                    .is_some_and(|key| guard.is_in_flight(&key));
                RowView {
                    cells: row.cells(),
                    actions: row
                        .actions()
                        .into_iter()
                        .map(|action| ActionView {
                            label: action.label(),
                            slug: action.slug(),
                            href: row.href(action),
                            post: matches!(action, RowAction::ToggleStatus { .. }),
                            disabled: busy && mutates(action),
                        })
                        .collect(),
                    error: table.row_error(&row.key()).map(str::to_string),
                }
            })
            .collect();
        Self {
            columns: R::COLUMNS,
            rows,
            failure: table.failure().map(str::to_string),
            filter: table.filter().to_string(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn mutates(action: RowAction) -> bool {
    matches!(
        action,
        RowAction::Delete | RowAction::ToggleStatus { .. } | RowAction::Config
    )
}

/// A known interface offered by an interface selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub name: String,
    pub selected: bool,
}

/// One rendered input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub id: String,
    pub name: &'static str,
    pub label: &'static str,
    pub checkbox: bool,
    pub interfaces: bool,
    pub required: bool,
    pub hint: Option<&'static str>,
    pub suffix: Option<&'static str>,
    pub value: String,
    pub checked: bool,
    pub locked: bool,
    pub error: Option<String>,
    pub choices: Vec<ChoiceView>,
    pub other_name: String,
    pub other_value: String,
}

/// A rendered entity form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSection {
    pub action: String,
    pub cancel: String,
    pub fields: Vec<FieldView>,
    pub message: Option<String>,
    pub banner: Option<String>,
    /// Target of the form's delete button, when the entity can be removed.
    pub delete: Option<String>,
}

impl FormSection {
    pub(crate) fn new<D: FormDraft>(
        form: &FormView<D>,
        scope: &D::Scope,
        action: String,
        cancel: String,
    ) -> Self {
        let values = form.values();
        let known = D::interface_choices(scope);
        let fields = D::FIELDS
            .iter()
            .map(|spec| {
                let selected = values.all(spec.name);
                FieldView {
                    id: format!("{}-{}", form.instance(), spec.name),
                    name: spec.name,
                    label: spec.label,
                    checkbox: spec.kind == FieldKind::Checkbox,
                    interfaces: spec.kind == FieldKind::Interfaces,
                    required: spec.required,
                    hint: spec.hint,
                    suffix: spec.suffix,
                    value: values.first(spec.name).to_string(),
                    checked: !values.is_blank(spec.name),
                    locked: form.is_locked(spec.name),
                    error: form.error(spec.name).map(str::to_string),
                    choices: known
                        .iter()
                        .map(|name| ChoiceView {
                            name: name.clone(),
                            selected: selected.contains(name),
                        })
                        .collect(),
                    other_name: spec.other_name(),
                    other_value: values.first(&spec.other_name()).to_string(),
                }
            })
            .collect();
        Self {
            action,
            cancel,
            fields,
            message: form.message().map(str::to_string),
            banner: form.banner().map(str::to_string),
            delete: None,
        }
    }

    #[must_use]
    pub fn with_delete(mut self, href: String) -> Self {
        self.delete = Some(href);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routerdesk_app::ports::ServerSummary;
    use routerdesk_app::views::{DhcpServerDraft, ForwardingDraft, ForwardingScope, Forwarder};
    use routerdesk_domain::dhcp::PoolStats;
    use std::sync::Arc;

    fn server_row(enabled: bool) -> ServerRow {
        let mut server = crate::testing::lan0();
        server.enabled = enabled;
        ServerRow {
            summary: ServerSummary {
                server,
                stats: PoolStats::default(),
            },
        }
    }

    #[test]
    fn should_link_server_actions_to_dialog_tabs() {
        let row = server_row(true);
        assert_eq!(row.href(RowAction::ViewLeases), "/dhcp/lan0?tab=leases");
        assert_eq!(row.href(RowAction::ViewDetails), "/dhcp/lan0?tab=details");
        assert_eq!(row.href(RowAction::Delete), "/dhcp/lan0/delete");
        assert_eq!(
            server_row(false).href(RowAction::ViewStaticMap),
            "/dhcp/lan0?tab=mappings"
        );
    }

    #[test]
    fn should_disable_mutating_actions_while_server_busy() {
        let table = TableView::loaded(vec![server_row(true)]);
        let guard = Arc::new(MutationGuard::new());
        let _permit = guard
            .try_acquire(EntityKey::Server(ServerName::new("lan0").unwrap()))
            .unwrap();

        let section = TableSection::new(&table, &guard);
        let actions = &section.rows[0].actions;
        let disabled: Vec<&str> = actions
            .iter()
            .filter(|a| a.disabled)
            .map(|a| a.slug)
            .collect();
        assert_eq!(disabled, vec!["delete", "status"]);
        assert!(actions.iter().any(|a| a.post && a.label == "Disable"));
    }

    #[test]
    fn should_render_failed_table_without_rows() {
        let table = TableView::<ServerRow>::failed("backend unavailable, please try again");
        let section = TableSection::new(&table, &MutationGuard::new());
        assert!(section.is_empty());
        assert_eq!(
            section.failure.as_deref(),
            Some("backend unavailable, please try again")
        );
    }

    #[test]
    fn should_describe_every_server_input() {
        let form = FormView::<DhcpServerDraft>::create(&());
        let section = FormSection::new(&form, &(), "/dhcp/new".to_string(), "/dhcp".to_string());
        let names: Vec<&str> = section.fields.iter().map(|f| f.name).collect();
        assert_eq!(names[0], "name");
        assert_eq!(names[1], "subnet");
        let lease = section.fields.iter().find(|f| f.name == "lease").unwrap();
        assert_eq!(lease.value, "86400");
        assert_eq!(lease.suffix, Some("seconds"));
        let enabled = section.fields.iter().find(|f| f.name == "enabled").unwrap();
        assert!(enabled.checkbox && enabled.checked);
        assert!(section.fields.iter().all(|f| f.id.ends_with(f.name)));
    }

    #[test]
    fn should_lock_identity_inputs_when_editing() {
        let form = FormView::<DhcpServerDraft>::edit(&crate::testing::lan0());
        let section = FormSection::new(&form, &(), String::new(), String::new());
        let locked: Vec<&str> = section
            .fields
            .iter()
            .filter(|f| f.locked)
            .map(|f| f.name)
            .collect();
        assert_eq!(locked, vec!["name", "subnet"]);
    }

    #[test]
    fn should_offer_known_interfaces_as_choices() {
        let scope = ForwardingScope {
            forwarder: Forwarder::Dns,
            known: crate::testing::interfaces(),
        };
        let form = FormView::<ForwardingDraft>::create(&scope);
        let section = FormSection::new(&form, &scope, String::new(), String::new());
        let interface = section.fields.iter().find(|f| f.interfaces).unwrap();
        assert_eq!(interface.choices.len(), 4);
        assert_eq!(interface.other_name, "other-interface");
        assert!(interface.required);
    }
}
