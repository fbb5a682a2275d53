//! In-memory repositories shared by the unit tests of this crate.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use ipnetwork::Ipv4Network;

use routerdesk_domain::blocklist::NetworkDiff;
use routerdesk_domain::dhcp::{DhcpServer, Lease, StaticMapping};
use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

use crate::backend::AdminBackend;
use crate::ports::{
    BlockedNetworkRepository, DhcpServerRepository, LeaseRepository, ServiceConfigRepository,
    StaticMappingRepository,
};

/// Counts repository calls and can simulate an unreachable store.
#[derive(Clone, Default)]
pub struct Tracker {
    calls: Arc<AtomicUsize>,
    down: Arc<AtomicBool>,
}

impl Tracker {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn hit(&self) -> Result<(), RouterDeskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(RouterDeskError::Transport(Box::new(std::io::Error::other(
                "store unreachable",
            ))));
        }
        Ok(())
    }
}

/// Holds a server update until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Clone, Default)]
pub struct InMemoryServerRepo {
    store: Arc<Mutex<BTreeMap<ServerName, DhcpServer>>>,
    pub tracker: Tracker,
    pub update_gate: Option<Arc<Gate>>,
}

impl DhcpServerRepository for InMemoryServerRepo {
    fn create(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            let mut store = self.store.lock().unwrap();
            store.insert(server.name.clone(), server.clone());
            server
        });
        async { result }
    }

    fn get_by_name(
        &self,
        name: &ServerName,
    ) -> impl Future<Output = Result<Option<DhcpServer>, RouterDeskError>> + Send {
        let result = self
            .tracker
            .hit()
            .map(|()| self.store.lock().unwrap().get(name).cloned());
        async { result }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<DhcpServer>, RouterDeskError>> + Send {
        let result = self
            .tracker
            .hit()
            .map(|()| self.store.lock().unwrap().values().cloned().collect());
        async { result }
    }

    fn update(
        &self,
        server: DhcpServer,
    ) -> impl Future<Output = Result<DhcpServer, RouterDeskError>> + Send {
        let hit = self.tracker.hit();
        let store = Arc::clone(&self.store);
        let gate = self.update_gate.clone();
        async move {
            hit?;
            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            store
                .lock()
                .unwrap()
                .insert(server.name.clone(), server.clone());
            Ok(server)
        }
    }

    fn delete(
        &self,
        name: &ServerName,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store.lock().unwrap().remove(name);
        });
        async { result }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMappingRepo {
    store: Arc<Mutex<BTreeMap<(ServerName, MappingId), StaticMapping>>>,
    pub tracker: Tracker,
}

impl StaticMappingRepository for InMemoryMappingRepo {
    fn create(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            let mut store = self.store.lock().unwrap();
            store.insert((server.clone(), mapping.id.clone()), mapping.clone());
            mapping
        });
        async { result }
    }

    fn get(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> impl Future<Output = Result<Option<StaticMapping>, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store
                .lock()
                .unwrap()
                .get(&(server.clone(), id.clone()))
                .cloned()
        });
        async { result }
    }

    fn find_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<StaticMapping>, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store
                .lock()
                .unwrap()
                .iter()
                .filter(|((owner, _), _)| owner == server)
                .map(|(_, mapping)| mapping.clone())
                .collect()
        });
        async { result }
    }

    fn update(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> impl Future<Output = Result<StaticMapping, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            let mut store = self.store.lock().unwrap();
            store.insert((server.clone(), mapping.id.clone()), mapping.clone());
            mapping
        });
        async { result }
    }

    fn delete(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store
                .lock()
                .unwrap()
                .remove(&(server.clone(), id.clone()));
        });
        async { result }
    }

    fn delete_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store
                .lock()
                .unwrap()
                .retain(|(owner, _), _| owner != server);
        });
        async { result }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryLeaseRepo {
    store: Arc<Mutex<BTreeMap<(ServerName, Ipv4Addr), Lease>>>,
    pub tracker: Tracker,
}

impl LeaseRepository for InMemoryLeaseRepo {
    fn upsert(&self, lease: Lease) -> impl Future<Output = Result<Lease, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            let mut store = self.store.lock().unwrap();
            store.insert((lease.pool.clone(), lease.ip_address), lease.clone());
            lease
        });
        async { result }
    }

    fn find_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<Vec<Lease>, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store
                .lock()
                .unwrap()
                .values()
                .filter(|lease| &lease.pool == server)
                .cloned()
                .collect()
        });
        async { result }
    }

    fn delete_by_server(
        &self,
        server: &ServerName,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store
                .lock()
                .unwrap()
                .retain(|(owner, _), _| owner != server);
        });
        async { result }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryServiceConfigRepo {
    store: Arc<Mutex<BTreeMap<ServiceKind, ServiceSettings>>>,
    pub tracker: Tracker,
}

impl ServiceConfigRepository for InMemoryServiceConfigRepo {
    fn get(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<Option<ServiceSettings>, RouterDeskError>> + Send {
        let result = self
            .tracker
            .hit()
            .map(|()| self.store.lock().unwrap().get(&kind).cloned());
        async { result }
    }

    fn put(
        &self,
        settings: ServiceSettings,
    ) -> impl Future<Output = Result<ServiceSettings, RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store
                .lock()
                .unwrap()
                .insert(settings.kind(), settings.clone());
            settings
        });
        async { result }
    }

    fn delete(
        &self,
        kind: ServiceKind,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            self.store.lock().unwrap().remove(&kind);
        });
        async { result }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBlockedNetworkRepo {
    store: Arc<Mutex<BTreeSet<Ipv4Network>>>,
    pub tracker: Tracker,
}

impl BlockedNetworkRepository for InMemoryBlockedNetworkRepo {
    fn get_all(&self) -> impl Future<Output = Result<Vec<Ipv4Network>, RouterDeskError>> + Send {
        let result = self
            .tracker
            .hit()
            .map(|()| self.store.lock().unwrap().iter().copied().collect());
        async { result }
    }

    fn apply(
        &self,
        diff: &NetworkDiff,
    ) -> impl Future<Output = Result<(), RouterDeskError>> + Send {
        let result = self.tracker.hit().map(|()| {
            let mut store = self.store.lock().unwrap();
            for network in &diff.deleted {
                store.remove(network);
            }
            store.extend(diff.added.iter().copied());
        });
        async { result }
    }
}

pub type TestBackend = AdminBackend<
    InMemoryServerRepo,
    InMemoryMappingRepo,
    InMemoryLeaseRepo,
    InMemoryServiceConfigRepo,
    InMemoryBlockedNetworkRepo,
>;

/// Repositories behind a [`TestBackend`], kept for inspection.
pub struct Harness {
    pub servers: InMemoryServerRepo,
    pub mappings: InMemoryMappingRepo,
    pub leases: InMemoryLeaseRepo,
    pub configs: InMemoryServiceConfigRepo,
    pub blocked: InMemoryBlockedNetworkRepo,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            servers: InMemoryServerRepo::default(),
            mappings: InMemoryMappingRepo::default(),
            leases: InMemoryLeaseRepo::default(),
            configs: InMemoryServiceConfigRepo::default(),
            blocked: InMemoryBlockedNetworkRepo::default(),
        }
    }

    /// Total number of repository calls so far.
    pub fn calls(&self) -> usize {
        self.servers.tracker.calls()
            + self.mappings.tracker.calls()
            + self.leases.tracker.calls()
            + self.configs.tracker.calls()
            + self.blocked.tracker.calls()
    }

    pub fn backend(&self) -> TestBackend {
        AdminBackend::new(
            self.servers.clone(),
            self.mappings.clone(),
            self.leases.clone(),
            self.configs.clone(),
            self.blocked.clone(),
        )
    }
}

pub fn server_name(name: &str) -> ServerName {
    ServerName::new(name).unwrap()
}

pub fn mapping_id(id: &str) -> MappingId {
    MappingId::new(id).unwrap()
}

/// `lan0` on `192.0.2.0/24` with pool `.10`–`.100`.
pub fn lan0() -> DhcpServer {
    DhcpServer::builder()
        .name(server_name("lan0"))
        .subnet("192.0.2.0/24".parse().unwrap())
        .range(Ipv4Addr::new(192, 0, 2, 10), Ipv4Addr::new(192, 0, 2, 100))
        .router(Some(Ipv4Addr::new(192, 0, 2, 1)))
        .build()
        .unwrap()
}

pub fn mapping(id: &str, mac: &str, last_octet: u8) -> StaticMapping {
    StaticMapping::new(
        mapping_id(id),
        mac.parse().unwrap(),
        Ipv4Addr::new(192, 0, 2, last_octet),
    )
}

pub fn lease(last_octet: u8, mac: &str, hostname: Option<&str>) -> Lease {
    Lease {
        ip_address: Ipv4Addr::new(192, 0, 2, last_octet),
        mac_address: mac.parse().unwrap(),
        expiration: routerdesk_domain::time::now() + chrono::Duration::hours(1),
        pool: server_name("lan0"),
        hostname: hostname.map(str::to_string),
    }
}
