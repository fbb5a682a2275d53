//! Form drafts of every editable entity.

use std::collections::BTreeSet;
use std::future::Future;
use std::str::FromStr;

use routerdesk_domain::dhcp::{DEFAULT_LEASE_SECONDS, DhcpServer, Lease, StaticMapping};
use routerdesk_domain::error::{RouterDeskError, ValidationError};
use routerdesk_domain::forwarding::{DEFAULT_CACHE_SIZE, ForwardingConfig, InterfaceSelection};
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::net::{parse_ipv4, parse_mac, parse_optional_ipv4, parse_subnet};
use routerdesk_domain::pppoe::PppoeConfig;
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

use crate::guard::EntityKey;
use crate::ports::ConfigBackend;
use crate::views::feedback::FieldErrors;
use crate::views::form::{FieldKind, FieldSpec, FormDraft, FormMode, FormValues, FormView, Refresh};
use crate::views::session::ViewSession;

/// Keeps the first error reported for each field.
#[derive(Default)]
struct Collector(FieldErrors);

impl Collector {
    fn take<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.reject(&RouterDeskError::from(err));
                None
            }
        }
    }

    fn reject(&mut self, err: &RouterDeskError) {
        let field = err.field().unwrap_or("form");
        self.0.entry(field).or_insert_with(|| err.to_string());
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, FieldErrors> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(self.0),
        }
    }
}

fn parse_number<T: FromStr>(field: &'static str, raw: &str, default: T) -> Result<T, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse().map_err(|_| ValidationError::InvalidField {
        field,
        reason: format!("{raw:?} is not a whole number"),
    })
}

fn optional_text(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

fn display_or_blank<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn is_checked(values: &FormValues, name: &str) -> bool {
    matches!(values.first(name), "1" | "on" | "true")
}

fn split_other(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|name| !name.is_empty())
}

const DHCP_SERVER_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "DHCP Name")
        .required()
        .hint("Unique name for this DHCP server"),
    FieldSpec::text("subnet", "Subnet")
        .required()
        .hint("IPv4 subnet. Must be a subnet configured on some interface. Example 192.0.2.0/24"),
    FieldSpec::text("range-start", "Range Start").hint(
        "First IPv4 address in subnet to be allocated. Without a range all allocations must be static-mapped",
    ),
    FieldSpec::text("range-stop", "Range Stop").hint(
        "Last IPv4 address in subnet to be allocated. Without a range all allocations must be static-mapped",
    ),
    FieldSpec::text("router", "Router"),
    FieldSpec::text("dns1", "DNS 1"),
    FieldSpec::text("dns2", "DNS 2"),
    FieldSpec::text("unifi-controller", "Unifi Controller").hint("IP address of UniFi controller"),
    FieldSpec::text("domain", "Domain"),
    FieldSpec::text("lease", "Lease Time").suffix("seconds"),
    FieldSpec::text("enabled", "Enable").kind(FieldKind::Checkbox),
];

/// Draft of a [`DhcpServer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DhcpServerDraft {
    pub name: String,
    pub subnet: String,
    pub range_start: String,
    pub range_stop: String,
    pub router: String,
    pub dns1: String,
    pub dns2: String,
    pub unifi_controller: String,
    pub domain: String,
    pub lease: String,
    pub enabled: bool,
}

impl FormDraft for DhcpServerDraft {
    type Entity = DhcpServer;
    type Scope = ();

    const FIELDS: &'static [FieldSpec] = DHCP_SERVER_FIELDS;
    const IDENTITY: &'static [&'static str] = &["name", "subnet"];

    fn defaults(_scope: &()) -> Self {
        Self {
            lease: DEFAULT_LEASE_SECONDS.to_string(),
            enabled: true,
            ..Self::default()
        }
    }

    fn from_entity(server: &DhcpServer) -> Self {
        Self {
            name: server.name.to_string(),
            subnet: server.subnet.to_string(),
            range_start: display_or_blank(server.range_start),
            range_stop: display_or_blank(server.range_stop),
            router: display_or_blank(server.router),
            dns1: display_or_blank(server.dns1),
            dns2: display_or_blank(server.dns2),
            unifi_controller: display_or_blank(server.unifi_controller),
            domain: server.domain.clone().unwrap_or_default(),
            lease: server.lease_seconds.to_string(),
            enabled: server.enabled,
        }
    }

    fn from_values(values: &FormValues) -> Self {
        Self {
            name: values.first("name").to_string(),
            subnet: values.first("subnet").to_string(),
            range_start: values.first("range-start").to_string(),
            range_stop: values.first("range-stop").to_string(),
            router: values.first("router").to_string(),
            dns1: values.first("dns1").to_string(),
            dns2: values.first("dns2").to_string(),
            unifi_controller: values.first("unifi-controller").to_string(),
            domain: values.first("domain").to_string(),
            lease: values.first("lease").to_string(),
            enabled: is_checked(values, "enabled"),
        }
    }

    fn to_values(&self) -> FormValues {
        let mut values = FormValues::default();
        values.set("name", &self.name);
        values.set("subnet", &self.subnet);
        values.set("range-start", &self.range_start);
        values.set("range-stop", &self.range_stop);
        values.set("router", &self.router);
        values.set("dns1", &self.dns1);
        values.set("dns2", &self.dns2);
        values.set("unifi-controller", &self.unifi_controller);
        values.set("domain", &self.domain);
        values.set("lease", &self.lease);
        if self.enabled {
            values.set("enabled", "1");
        }
        values
    }

    fn parse(&self, _scope: &()) -> Result<DhcpServer, FieldErrors> {
        let mut errors = Collector::default();
        let name = errors.take(ServerName::new(self.name.trim()));
        let subnet = errors.take(parse_subnet("subnet", &self.subnet));
        let range_start = errors.take(parse_optional_ipv4("range-start", &self.range_start));
        let range_stop = errors.take(parse_optional_ipv4("range-stop", &self.range_stop));
        let router = errors.take(parse_optional_ipv4("router", &self.router));
        let dns1 = errors.take(parse_optional_ipv4("dns1", &self.dns1));
        let dns2 = errors.take(parse_optional_ipv4("dns2", &self.dns2));
        let unifi = errors.take(parse_optional_ipv4("unifi-controller", &self.unifi_controller));
        let lease = errors.take(parse_number("lease", &self.lease, DEFAULT_LEASE_SECONDS));

        let (
            Some(name),
            Some(subnet),
            Some(range_start),
            Some(range_stop),
            Some(router),
            Some(dns1),
            Some(dns2),
            Some(unifi),
            Some(lease),
        ) = (
            name, subnet, range_start, range_stop, router, dns1, dns2, unifi, lease,
        )
        else {
            return errors.finish(None);
        };

        let built = DhcpServer::builder()
            .name(name)
            .subnet(subnet)
            .range_start(range_start)
            .range_stop(range_stop)
            .router(router)
            .dns(dns1, dns2)
            .unifi_controller(unifi)
            .domain(optional_text(&self.domain))
            .lease_seconds(lease)
            .enabled(self.enabled)
            .build();
        match built {
            Ok(server) => errors.finish(Some(server)),
            Err(err) => {
                errors.reject(&err);
                errors.finish(None)
            }
        }
    }

    fn entity_key(_scope: &(), server: &DhcpServer) -> EntityKey {
        EntityKey::Server(server.name.clone())
    }

    fn save<B>(
        backend: &B,
        _scope: &(),
        mode: FormMode,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        async move {
            match mode {
                FormMode::Create => backend.create_server(server).await,
                FormMode::Edit => backend.update_server(server).await,
            }
        }
    }

    fn refresh(_scope: &()) -> Refresh {
        Refresh::Servers
    }
}

const STATIC_MAPPING_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("id", "ID").required(),
    FieldSpec::text("macaddress", "MAC Address").required(),
    FieldSpec::text("ipaddress", "IP Address").required(),
];

/// Draft of a [`StaticMapping`] of one server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticMappingDraft {
    pub id: String,
    pub mac_address: String,
    pub ip_address: String,
}

impl StaticMappingDraft {
    /// Draft promoting `lease` to a static mapping.
    ///
    /// The hostname, reduced to the characters a mapping id accepts, is
    /// suggested as the id.
    #[must_use]
    pub fn from_lease(lease: &Lease) -> Self {
        let id = lease
            .hostname
            .as_deref()
            .unwrap_or_default()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '-'
                }
            })
            .take(64)
            .collect();
        Self {
            id,
            mac_address: lease.mac_address.to_string(),
            ip_address: lease.ip_address.to_string(),
        }
    }

    /// Create form for the "map static IP" action; the MAC is locked.
    #[must_use]
    pub fn map_static_form(lease: &Lease) -> FormView<Self> {
        FormView::prefilled(Self::from_lease(lease), &["macaddress"])
    }
}

impl FormDraft for StaticMappingDraft {
    type Entity = StaticMapping;
    type Scope = ServerName;

    const FIELDS: &'static [FieldSpec] = STATIC_MAPPING_FIELDS;
    const IDENTITY: &'static [&'static str] = &["id"];

    fn defaults(_server: &ServerName) -> Self {
        Self::default()
    }

    fn from_entity(mapping: &StaticMapping) -> Self {
        Self {
            id: mapping.id.to_string(),
            mac_address: mapping.mac_address.to_string(),
            ip_address: mapping.ip_address.to_string(),
        }
    }

    fn from_values(values: &FormValues) -> Self {
        Self {
            id: values.first("id").to_string(),
            mac_address: values.first("macaddress").to_string(),
            ip_address: values.first("ipaddress").to_string(),
        }
    }

    fn to_values(&self) -> FormValues {
        let mut values = FormValues::default();
        values.set("id", &self.id);
        values.set("macaddress", &self.mac_address);
        values.set("ipaddress", &self.ip_address);
        values
    }

    fn parse(&self, _server: &ServerName) -> Result<StaticMapping, FieldErrors> {
        let mut errors = Collector::default();
        let id = errors.take(MappingId::new(self.id.trim()));
        let mac = errors.take(parse_mac("macaddress", &self.mac_address));
        let ip = errors.take(parse_ipv4("ipaddress", &self.ip_address));
        let mapping = match (id, mac, ip) {
            (Some(id), Some(mac), Some(ip)) => Some(StaticMapping::new(id, mac, ip)),
            _ => None,
        };
        errors.finish(mapping)
    }

    fn entity_key(server: &ServerName, mapping: &StaticMapping) -> EntityKey {
        EntityKey::Mapping(server.clone(), mapping.id.clone())
    }

    fn save<B>(
        backend: &B,
        server: &ServerName,
        mode: FormMode,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        async move {
            match mode {
                FormMode::Create => backend.create_mapping(server, mapping).await,
                FormMode::Edit => backend.update_mapping(server, mapping).await,
            }
        }
    }

    fn refresh(server: &ServerName) -> Refresh {
        Refresh::Mappings(server.clone())
    }
}

/// The two services configured through a [`ForwardingDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarder {
    Dns,
    Blacklist,
}

impl Forwarder {
    #[must_use]
    pub fn kind(self) -> ServiceKind {
        match self {
            Self::Dns => ServiceKind::Dns,
            Self::Blacklist => ServiceKind::Blacklist,
        }
    }

    fn wrap(self, config: ForwardingConfig) -> ServiceSettings {
        match self {
            Self::Dns => ServiceSettings::Dns(config),
            Self::Blacklist => ServiceSettings::Blacklist(config),
        }
    }
}

/// Which forwarder a form edits, and the interfaces the router reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingScope {
    pub forwarder: Forwarder,
    pub known: Vec<String>,
}

const FORWARDING_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("cache-size", "Cache Size").hint("Number of DNS queries to cache"),
    FieldSpec::text("interface", "Interface")
        .kind(FieldKind::Interfaces)
        .required(),
];

/// Draft of the DNS forwarding or DNS blacklist settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingDraft {
    pub cache_size: String,
    pub interfaces: Vec<String>,
    pub other_interfaces: String,
}

impl FormDraft for ForwardingDraft {
    type Entity = ForwardingConfig;
    type Scope = ForwardingScope;

    const FIELDS: &'static [FieldSpec] = FORWARDING_FIELDS;
    const IDENTITY: &'static [&'static str] = &[];

    fn defaults(_scope: &ForwardingScope) -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE.to_string(),
            ..Self::default()
        }
    }

    fn from_entity(config: &ForwardingConfig) -> Self {
        let mut interfaces = Vec::new();
        let mut others = Vec::new();
        for selection in &config.interfaces {
            match selection {
                InterfaceSelection::Known(name) => interfaces.push(name.clone()),
                InterfaceSelection::Other(name) => others.push(name.as_str()),
            }
        }
        Self {
            cache_size: config.cache_size.to_string(),
            interfaces,
            other_interfaces: others.join(", "),
        }
    }

    fn from_values(values: &FormValues) -> Self {
        Self {
            cache_size: values.first("cache-size").to_string(),
            interfaces: values
                .all("interface")
                .iter()
                .filter(|name| !name.trim().is_empty())
                .cloned()
                .collect(),
            other_interfaces: values.first("other-interface").to_string(),
        }
    }

    fn to_values(&self) -> FormValues {
        let mut values = FormValues::default();
        values.set("cache-size", &self.cache_size);
        for name in &self.interfaces {
            values.push("interface", name);
        }
        values.set("other-interface", &self.other_interfaces);
        values
    }

    fn parse(&self, scope: &ForwardingScope) -> Result<ForwardingConfig, FieldErrors> {
        let mut errors = Collector::default();
        let cache_size = errors.take(parse_number(
            "cache-size",
            &self.cache_size,
            DEFAULT_CACHE_SIZE,
        ));
        let interfaces: BTreeSet<InterfaceSelection> = self
            .interfaces
            .iter()
            .map(String::as_str)
            .chain(split_other(&self.other_interfaces))
            .map(|name| InterfaceSelection::classify(name, &scope.known))
            .collect();
        let Some(cache_size) = cache_size else {
            return errors.finish(None);
        };
        let config = ForwardingConfig {
            cache_size,
            interfaces,
        };
        if let Err(err) = config.validate() {
            errors.reject(&err);
        }
        errors.finish(Some(config))
    }

    fn entity_key(scope: &ForwardingScope, _config: &ForwardingConfig) -> EntityKey {
        EntityKey::Service(scope.forwarder.kind())
    }

    fn save<B>(
        backend: &B,
        scope: &ForwardingScope,
        _mode: FormMode,
        config: ForwardingConfig,
    ) -> impl Future<Output = Result<ForwardingConfig, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        let settings = scope.forwarder.wrap(config.clone());
        async move {
            backend.put_service(settings).await?;
            Ok(config)
        }
    }

    fn refresh(scope: &ForwardingScope) -> Refresh {
        Refresh::Service(scope.forwarder.kind())
    }

    fn interface_choices(scope: &ForwardingScope) -> &[String] {
        &scope.known
    }
}

impl ForwardingDraft {
    /// Form for the stored settings, or a create form while unconfigured.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn load_form<B>(
        backend: &B,
        scope: &ForwardingScope,
    ) -> Result<FormView<Self>, RouterDeskError>
    where
        B: ConfigBackend + Sync,
    {
        Ok(match backend.get_service(scope.forwarder.kind()).await? {
            Some(ServiceSettings::Dns(config) | ServiceSettings::Blacklist(config)) => {
                FormView::edit(&config)
            }
            Some(ServiceSettings::Pppoe(_)) | None => FormView::create(scope),
        })
    }
}

const PPPOE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("client-ip-start", "Client IP pool range start")
        .required()
        .hint("First IPv4 address for client pool. Example: 192.0.2.1"),
    FieldSpec::text("client-ip-stop", "Client IP pool range stop")
        .required()
        .hint("Last IPv4 address for client pool. Must be within the same /24 as the range start. Example: 192.0.2.254"),
    FieldSpec::text("radius-server-ip", "RADIUS server IP address")
        .required()
        .hint("IPv4 address of the RADIUS server. Example: 192.0.2.1"),
    FieldSpec::text("radius-server-key", "RADIUS server key")
        .required()
        .hint("Password key for RADIUS server"),
    FieldSpec::text("mtu", "MTU"),
    FieldSpec::text("dns1", "DNS 1").hint("IPv4 address. Example: 192.0.2.1"),
    FieldSpec::text("dns2", "DNS 2").hint("IPv4 address. Example: 192.0.2.1"),
    FieldSpec::text("interface", "Interface")
        .kind(FieldKind::Interfaces)
        .required(),
];

/// Interfaces offered by the PPPoE form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PppoeScope {
    pub known: Vec<String>,
}

/// Draft of the PPPoE server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PppoeDraft {
    pub client_ip_start: String,
    pub client_ip_stop: String,
    pub radius_server_ip: String,
    pub radius_server_key: String,
    pub mtu: String,
    pub dns1: String,
    pub dns2: String,
    pub interfaces: Vec<String>,
    pub other_interfaces: String,
}

impl FormDraft for PppoeDraft {
    type Entity = PppoeConfig;
    type Scope = PppoeScope;

    const FIELDS: &'static [FieldSpec] = PPPOE_FIELDS;
    const IDENTITY: &'static [&'static str] = &[];

    fn defaults(_scope: &PppoeScope) -> Self {
        Self::default()
    }

    fn from_entity(config: &PppoeConfig) -> Self {
        Self {
            client_ip_start: config.client_ip_start.to_string(),
            client_ip_stop: config.client_ip_stop.to_string(),
            radius_server_ip: config.radius_server_ip.to_string(),
            radius_server_key: config.radius_server_key.clone(),
            mtu: display_or_blank(config.mtu),
            dns1: display_or_blank(config.dns1),
            dns2: display_or_blank(config.dns2),
            interfaces: config.interfaces.iter().cloned().collect(),
            other_interfaces: String::new(),
        }
    }

    fn from_values(values: &FormValues) -> Self {
        Self {
            client_ip_start: values.first("client-ip-start").to_string(),
            client_ip_stop: values.first("client-ip-stop").to_string(),
            radius_server_ip: values.first("radius-server-ip").to_string(),
            radius_server_key: values.first("radius-server-key").to_string(),
            mtu: values.first("mtu").to_string(),
            dns1: values.first("dns1").to_string(),
            dns2: values.first("dns2").to_string(),
            interfaces: values
                .all("interface")
                .iter()
                .filter(|name| !name.trim().is_empty())
                .cloned()
                .collect(),
            other_interfaces: values.first("other-interface").to_string(),
        }
    }

    fn to_values(&self) -> FormValues {
        let mut values = FormValues::default();
        values.set("client-ip-start", &self.client_ip_start);
        values.set("client-ip-stop", &self.client_ip_stop);
        values.set("radius-server-ip", &self.radius_server_ip);
        values.set("radius-server-key", &self.radius_server_key);
        values.set("mtu", &self.mtu);
        values.set("dns1", &self.dns1);
        values.set("dns2", &self.dns2);
        for name in &self.interfaces {
            values.push("interface", name);
        }
        values.set("other-interface", &self.other_interfaces);
        values
    }

    fn parse(&self, _scope: &PppoeScope) -> Result<PppoeConfig, FieldErrors> {
        let mut errors = Collector::default();
        let start = errors.take(parse_ipv4("client-ip-start", &self.client_ip_start));
        let stop = errors.take(parse_ipv4("client-ip-stop", &self.client_ip_stop));
        let radius = errors.take(parse_ipv4("radius-server-ip", &self.radius_server_ip));
        let mtu = errors.take(if self.mtu.trim().is_empty() {
            Ok(None)
        } else {
            parse_number("mtu", &self.mtu, 0).map(Some)
        });
        let dns1 = errors.take(parse_optional_ipv4("dns1", &self.dns1));
        let dns2 = errors.take(parse_optional_ipv4("dns2", &self.dns2));

        let (Some(start), Some(stop), Some(radius), Some(mtu), Some(dns1), Some(dns2)) =
            (start, stop, radius, mtu, dns1, dns2)
        else {
            return errors.finish(None);
        };
        let config = PppoeConfig {
            client_ip_start: start,
            client_ip_stop: stop,
            radius_server_ip: radius,
            radius_server_key: self.radius_server_key.trim().to_string(),
            mtu,
            dns1,
            dns2,
            interfaces: self
                .interfaces
                .iter()
                .map(|name| name.trim())
                .chain(split_other(&self.other_interfaces))
                .map(str::to_string)
                .collect(),
        };
        if let Err(err) = config.validate() {
            errors.reject(&err);
        }
        errors.finish(Some(config))
    }

    fn entity_key(_scope: &PppoeScope, _config: &PppoeConfig) -> EntityKey {
        EntityKey::Service(ServiceKind::Pppoe)
    }

    fn save<B>(
        backend: &B,
        _scope: &PppoeScope,
        _mode: FormMode,
        config: PppoeConfig,
    ) -> impl Future<Output = Result<PppoeConfig, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync,
    {
        let settings = ServiceSettings::Pppoe(config.clone());
        async move {
            backend.put_service(settings).await?;
            Ok(config)
        }
    }

    fn refresh(_scope: &PppoeScope) -> Refresh {
        Refresh::Service(ServiceKind::Pppoe)
    }

    fn interface_choices(scope: &PppoeScope) -> &[String] {
        &scope.known
    }
}

impl PppoeDraft {
    /// Form for the stored settings, or a create form while unconfigured.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn load_form<B>(
        backend: &B,
        scope: &PppoeScope,
    ) -> Result<FormView<Self>, RouterDeskError>
    where
        B: ConfigBackend + Sync,
    {
        Ok(match backend.get_service(ServiceKind::Pppoe).await? {
            Some(ServiceSettings::Pppoe(config)) => FormView::edit(&config),
            Some(ServiceSettings::Dns(_) | ServiceSettings::Blacklist(_)) | None => {
                FormView::create(scope)
            }
        })
    }
}

/// Remove the settings of a service, one change at a time.
///
/// # Errors
///
/// Returns [`RouterDeskError::Busy`] while the settings are being saved, or
/// the backend error.
pub async fn delete_service<B>(
    session: &ViewSession,
    backend: &B,
    kind: ServiceKind,
) -> Result<(), RouterDeskError>
where
    B: ConfigBackend + Sync,
{
    let _permit = session.begin_mutation(EntityKey::Service(kind))?;
    backend.delete_service(kind).await
}
