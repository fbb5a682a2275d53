//! In-memory [`ConfigBackend`] for handler tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use ipnetwork::Ipv4Network;
use routerdesk_app::ports::{ConfigBackend, ServerSummary};
use routerdesk_domain::blocklist::{NetworkDiff, extract_networks, merge};
use routerdesk_domain::dhcp::{DhcpServer, Lease, PoolStats, StaticMapping};
use routerdesk_domain::error::{ConflictError, NotFoundError, RouterDeskError, ValidationError};
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::service::{ServiceKind, ServiceSettings};
use routerdesk_domain::time::now;

use crate::state::AppState;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

#[derive(Default)]
struct Store {
    servers: BTreeMap<ServerName, DhcpServer>,
    mappings: Vec<(ServerName, StaticMapping)>,
    leases: Vec<Lease>,
    services: BTreeMap<ServiceKind, ServiceSettings>,
    blocked: Vec<Ipv4Network>,
}

impl Store {
    fn server(&self, name: &ServerName) -> Result<&DhcpServer, RouterDeskError> {
        self.servers.get(name).ok_or_else(|| {
            NotFoundError {
                entity: "DhcpServer",
                id: name.to_string(),
            }
            .into()
        })
    }

    fn mappings_of(&self, server: &ServerName) -> Vec<StaticMapping> {
        self.mappings
            .iter()
            .filter(|(owner, _)| owner == server)
            .map(|(_, mapping)| mapping.clone())
            .collect()
    }

    fn leases_of(&self, server: &ServerName) -> Vec<Lease> {
        let mut leases: Vec<Lease> = self
            .leases
            .iter()
            .filter(|lease| &lease.pool == server)
            .cloned()
            .collect();
        leases.sort_by_key(|lease| lease.ip_address);
        leases
    }

    fn summary(&self, server: &DhcpServer) -> ServerSummary {
        ServerSummary {
            stats: PoolStats::compute(
                server,
                &self.leases_of(&server.name),
                &self.mappings_of(&server.name),
                now(),
            ),
            server: server.clone(),
        }
    }

    fn mapping_conflict(
        &self,
        server: &ServerName,
        mapping: &StaticMapping,
        skip: Option<&MappingId>,
    ) -> Option<ConflictError> {
        self.mappings
            .iter()
            .filter(|(owner, existing)| owner == server && Some(&existing.id) != skip)
            .find_map(|(_, existing)| {
                if existing.id == mapping.id {
                    Some(("id", mapping.id.to_string()))
                } else if existing.mac_address == mapping.mac_address {
                    Some(("macaddress", mapping.mac_address.to_string()))
                } else if existing.ip_address == mapping.ip_address {
                    Some(("ipaddress", mapping.ip_address.to_string()))
                } else {
                    None
                }
            })
            .map(|(field, value)| ConflictError {
                entity: "StaticMapping",
                field,
                value,
            })
    }
}

/// Backend keeping everything in one locked map; `set_down` simulates an
/// unreachable backend.
#[derive(Default)]
pub(crate) struct MemoryBackend {
    store: Mutex<Store>,
    down: AtomicBool,
}

impl MemoryBackend {
    pub(crate) fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn store(&self) -> Result<std::sync::MutexGuard<'_, Store>, RouterDeskError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RouterDeskError::Transport(Box::new(std::io::Error::other(
                "connection refused",
            ))));
        }
        Ok(self.store.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ConfigBackend for MemoryBackend {
    async fn list_servers(&self) -> Result<Vec<ServerSummary>, RouterDeskError> {
        let store = self.store()?;
        Ok(store.servers.values().map(|s| store.summary(s)).collect())
    }

    async fn get_server(&self, name: &ServerName) -> Result<ServerSummary, RouterDeskError> {
        let store = self.store()?;
        let server = store.server(name)?;
        Ok(store.summary(server))
    }

    async fn create_server(&self, server: DhcpServer) -> Result<DhcpServer, RouterDeskError> {
        server.validate()?;
        let mut store = self.store()?;
        if store.servers.contains_key(&server.name) {
            return Err(ConflictError {
                entity: "DhcpServer",
                field: "name",
                value: server.name.to_string(),
            }
            .into());
        }
        store.servers.insert(server.name.clone(), server.clone());
        Ok(server)
    }

    async fn update_server(&self, server: DhcpServer) -> Result<DhcpServer, RouterDeskError> {
        server.validate()?;
        let mut store = self.store()?;
        store.server(&server.name)?;
        store.servers.insert(server.name.clone(), server.clone());
        Ok(server)
    }

    async fn set_server_enabled(
        &self,
        name: &ServerName,
        enabled: bool,
    ) -> Result<DhcpServer, RouterDeskError> {
        let mut store = self.store()?;
        let mut server = store.server(name)?.clone();
        server.enabled = enabled;
        store.servers.insert(name.clone(), server.clone());
        Ok(server)
    }

    async fn delete_server(&self, name: &ServerName) -> Result<(), RouterDeskError> {
        let mut store = self.store()?;
        store.servers.remove(name);
        store.mappings.retain(|(owner, _)| owner != name);
        store.leases.retain(|lease| &lease.pool != name);
        Ok(())
    }

    async fn list_mappings(
        &self,
        server: &ServerName,
    ) -> Result<Vec<StaticMapping>, RouterDeskError> {
        let store = self.store()?;
        store.server(server)?;
        Ok(store.mappings_of(server))
    }

    async fn create_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> Result<StaticMapping, RouterDeskError> {
        let mut store = self.store()?;
        mapping.validate_for(store.server(server)?)?;
        if let Some(conflict) = store.mapping_conflict(server, &mapping, None) {
            return Err(conflict.into());
        }
        store.mappings.push((server.clone(), mapping.clone()));
        Ok(mapping)
    }

    async fn update_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> Result<StaticMapping, RouterDeskError> {
        let mut store = self.store()?;
        mapping.validate_for(store.server(server)?)?;
        if let Some(conflict) = store.mapping_conflict(server, &mapping, Some(&mapping.id)) {
            return Err(conflict.into());
        }
        let Some(slot) = store
            .mappings
            .iter_mut()
            .find(|(owner, existing)| owner == server && existing.id == mapping.id)
        else {
            return Err(NotFoundError {
                entity: "StaticMapping",
                id: mapping.id.to_string(),
            }
            .into());
        };
        slot.1 = mapping.clone();
        Ok(mapping)
    }

    async fn delete_mapping(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> Result<(), RouterDeskError> {
        let mut store = self.store()?;
        store
            .mappings
            .retain(|(owner, mapping)| !(owner == server && &mapping.id == id));
        Ok(())
    }

    async fn list_leases(&self, server: &ServerName) -> Result<Vec<Lease>, RouterDeskError> {
        let store = self.store()?;
        store.server(server)?;
        Ok(store.leases_of(server))
    }

    async fn record_lease(&self, lease: Lease) -> Result<Lease, RouterDeskError> {
        let mut store = self.store()?;
        lease.validate_for(store.server(&lease.pool)?)?;
        store
            .leases
            .retain(|old| !(old.pool == lease.pool && old.ip_address == lease.ip_address));
        store.leases.push(lease.clone());
        Ok(lease)
    }

    async fn get_service(
        &self,
        kind: ServiceKind,
    ) -> Result<Option<ServiceSettings>, RouterDeskError> {
        Ok(self.store()?.services.get(&kind).cloned())
    }

    async fn put_service(
        &self,
        settings: ServiceSettings,
    ) -> Result<ServiceSettings, RouterDeskError> {
        settings.validate()?;
        self.store()?
            .services
            .insert(settings.kind(), settings.clone());
        Ok(settings)
    }

    async fn delete_service(&self, kind: ServiceKind) -> Result<(), RouterDeskError> {
        self.store()?.services.remove(&kind);
        Ok(())
    }
    async fn list_blocked_networks(&self) -> Result<Vec<Ipv4Network>, RouterDeskError> {
        Ok(self.store()?.blocked.clone())
    }

    async fn update_blocked_networks(&self, feed: &str) -> Result<NetworkDiff, RouterDeskError> {
        let found = extract_networks(feed);
        if found.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "networks",
                reason: "feed holds no IPv4 network".to_string(),
            }
            .into());
        }
        let incoming = merge(found);
        let mut store = self.store()?;
        let diff = NetworkDiff::between(&store.blocked, &incoming);
        store.blocked = incoming;
        Ok(diff)
    }
}

pub(crate) fn interfaces() -> Vec<String> {
    ["eth0", "eth1", "eth2", "switch0"]
        .map(String::from)
        .to_vec()
}

pub(crate) fn state() -> AppState<MemoryBackend> {
    AppState::new(MemoryBackend::default(), interfaces())
}

/// `lan0` serving `192.0.2.0/24` with the range `.10`–`.100`.
pub(crate) fn lan0() -> DhcpServer {
    DhcpServer::builder()
        .name(ServerName::new("lan0").unwrap())
        .subnet("192.0.2.0/24".parse().unwrap())
        .range("192.0.2.10".parse().unwrap(), "192.0.2.100".parse().unwrap())
        .build()
        .unwrap()
}

pub(crate) fn lease(last_octet: u8, mac: &str, hostname: Option<&str>) -> Lease {
    Lease {
        ip_address: std::net::Ipv4Addr::new(192, 0, 2, last_octet),
        mac_address: mac.parse().unwrap(),
        expiration: now() + chrono::Duration::hours(1),
        pool: ServerName::new("lan0").unwrap(),
        hostname: hostname.map(String::from),
    }
}

/// Rendered response of a dashboard request.
pub(crate) struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub html: String,
}

pub(crate) async fn send(app: Router, request: Request<Body>) -> Page {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    Page {
        status,
        location,
        html: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub(crate) fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}
