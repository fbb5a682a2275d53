//! Service settings: DNS forwarding, DNS blacklist and PPPoE server.

use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::service::{ServiceKind, ServiceSettings};

use crate::ports::ServiceConfigRepository;

/// Application service for the singleton service settings.
pub struct ServiceConfigService<R> {
    repo: R,
}

impl<R: ServiceConfigRepository> ServiceConfigService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stored settings of `kind`, `None` while unconfigured.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn get(&self, kind: ServiceKind) -> Result<Option<ServiceSettings>, RouterDeskError> {
        self.repo.get(kind).await
    }

    /// Validate and store settings.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    pub async fn put(&self, settings: ServiceSettings) -> Result<ServiceSettings, RouterDeskError> {
        if let Err(err) = settings.validate() {
            tracing::warn!(service = %settings.kind(), error = %err, "rejected service settings");
            return Err(err);
        }
        let stored = self.repo.put(settings).await?;
        tracing::info!(service = %stored.kind(), "service settings saved");
        Ok(stored)
    }

    /// Remove the settings of `kind`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete(&self, kind: ServiceKind) -> Result<(), RouterDeskError> {
        self.repo.delete(kind).await?;
        tracing::info!(service = %kind, "service settings removed");
        Ok(())
    }
}
