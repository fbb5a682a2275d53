//! One in-flight mutation per entity.
//!
//! Every create, update or delete issued from a view takes a
//! [`MutationPermit`] for the entity it touches. A second mutation of the
//! same entity while the first is still pending is rejected with
//! [`BusyError`] instead of racing it against the backend.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use routerdesk_domain::error::BusyError;
use routerdesk_domain::id::{MappingId, ServerName};
use routerdesk_domain::service::ServiceKind;

/// Identity of a mutable entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Server(ServerName),
    Mapping(ServerName, MappingId),
    Service(ServiceKind),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(name) => write!(f, "DHCP server {name}"),
            Self::Mapping(server, id) => write!(f, "static mapping {id} of {server}"),
            Self::Service(kind) => write!(f, "{} settings", kind.title()),
        }
    }
}

/// Tracks the entities that currently have a mutation in flight.
#[derive(Debug, Default)]
pub struct MutationGuard {
    in_flight: Mutex<HashSet<EntityKey>>,
}

impl MutationGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `key` until the returned permit is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BusyError`] when a mutation of `key` is already in flight.
    pub fn try_acquire(self: &Arc<Self>, key: EntityKey) -> Result<MutationPermit, BusyError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.contains(&key) {
            tracing::warn!(%key, "mutation rejected, another one is in flight");
            return Err(BusyError {
                key: key.to_string(),
            });
        }
        in_flight.insert(key.clone());
        Ok(MutationPermit {
            guard: Arc::clone(self),
            key,
        })
    }

    /// Whether a mutation of `key` is pending.
    #[must_use]
    pub fn is_in_flight(&self, key: &EntityKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Exclusive right to mutate one entity, released on drop.
#[derive(Debug)]
pub struct MutationPermit {
    guard: Arc<MutationGuard>,
    key: EntityKey,
}

impl MutationPermit {
    #[must_use]
    pub fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl Drop for MutationPermit {
    fn drop(&mut self) {
        self.guard
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lan0() -> EntityKey {
        EntityKey::Server(ServerName::new("lan0").unwrap())
    }

    #[test]
    fn should_reject_second_permit_for_same_entity() {
        let guard = Arc::new(MutationGuard::new());
        let permit = guard.try_acquire(lan0()).unwrap();
        assert!(guard.is_in_flight(permit.key()));

        let err = guard.try_acquire(lan0()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "another change to DHCP server lan0 is still in progress"
        );
    }

    #[test]
    fn should_release_entity_when_permit_dropped() {
        let guard = Arc::new(MutationGuard::new());
        drop(guard.try_acquire(lan0()).unwrap());
        assert!(!guard.is_in_flight(&lan0()));
        assert!(guard.try_acquire(lan0()).is_ok());
    }

    #[test]
    fn should_allow_parallel_mutations_of_distinct_entities() {
        let guard = Arc::new(MutationGuard::new());
        let _server = guard.try_acquire(lan0()).unwrap();
        let mapping = EntityKey::Mapping(
            ServerName::new("lan0").unwrap(),
            MappingId::new("nas").unwrap(),
        );
        assert!(guard.try_acquire(mapping).is_ok());
        assert!(guard.try_acquire(EntityKey::Service(ServiceKind::Dns)).is_ok());
    }
}
