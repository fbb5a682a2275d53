//! Static mapping service: use-cases for the fixed MAC→IP bindings of a server.

use routerdesk_domain::dhcp::StaticMapping;
use routerdesk_domain::error::{ConflictError, NotFoundError, RouterDeskError};
use routerdesk_domain::id::{MappingId, ServerName};

use super::require_server;
use crate::ports::{DhcpServerRepository, StaticMappingRepository};

/// Application service for static mapping CRUD.
pub struct MappingService<SR, MR> {
    servers: SR,
    mappings: MR,
}

impl<SR, MR> MappingService<SR, MR>
where
    SR: DhcpServerRepository,
    MR: StaticMappingRepository,
{
    /// Create a new service backed by the given repositories.
    pub fn new(servers: SR, mappings: MR) -> Self {
        Self { servers, mappings }
    }

    /// List the mappings of `server`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] for an unknown server, or a
    /// storage error from the repositories.
    pub async fn list_mappings(
        &self,
        server: &ServerName,
    ) -> Result<Vec<StaticMapping>, RouterDeskError> {
        require_server(&self.servers, server).await?;
        let mut mappings = self.mappings.find_by_server(server).await?;
        mappings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(mappings)
    }

    /// Create a mapping under `server`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] for an unknown server,
    /// [`RouterDeskError::Validation`] when the address is not a host of the
    /// server subnet, [`RouterDeskError::Conflict`] when the id, MAC or IP is
    /// already mapped, or a storage error from the repositories.
    pub async fn create_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> Result<StaticMapping, RouterDeskError> {
        let owner = require_server(&self.servers, server).await?;
        mapping.validate_for(&owner)?;
        let existing = self.mappings.find_by_server(server).await?;
        if existing.iter().any(|other| other.id == mapping.id) {
            return Err(conflict(server, "id", mapping.id.to_string()));
        }
        ensure_unique(server, &mapping, &existing)?;
        let created = self.mappings.create(server, mapping).await?;
        tracing::info!(
            server = %server,
            mapping = %created.id,
            mac = %created.mac_address,
            ip = %created.ip_address,
            "static mapping created"
        );
        Ok(created)
    }

    /// Update an existing mapping of `server`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] for an unknown server or
    /// mapping, [`RouterDeskError::Validation`] or [`RouterDeskError::Conflict`]
    /// as for [`create_mapping`](Self::create_mapping), or a storage error.
    pub async fn update_mapping(
        &self,
        server: &ServerName,
        mapping: StaticMapping,
    ) -> Result<StaticMapping, RouterDeskError> {
        let owner = require_server(&self.servers, server).await?;
        mapping.validate_for(&owner)?;
        let existing = self.mappings.find_by_server(server).await?;
        if !existing.iter().any(|other| other.id == mapping.id) {
            return Err(NotFoundError {
                entity: "StaticMapping",
                id: format!("{server}/{}", mapping.id),
            }
            .into());
        }
        let others: Vec<StaticMapping> = existing
            .into_iter()
            .filter(|other| other.id != mapping.id)
            .collect();
        ensure_unique(server, &mapping, &others)?;
        let updated = self.mappings.update(server, mapping).await?;
        tracing::info!(server = %server, mapping = %updated.id, "static mapping updated");
        Ok(updated)
    }

    /// Delete a mapping. Missing mappings are ignored.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_mapping(
        &self,
        server: &ServerName,
        id: &MappingId,
    ) -> Result<(), RouterDeskError> {
        self.mappings.delete(server, id).await?;
        tracing::info!(server = %server, mapping = %id, "static mapping deleted");
        Ok(())
    }
}

fn ensure_unique(
    server: &ServerName,
    mapping: &StaticMapping,
    others: &[StaticMapping],
) -> Result<(), RouterDeskError> {
    if others
        .iter()
        .any(|other| other.mac_address == mapping.mac_address)
    {
        return Err(conflict(server, "macaddress", mapping.mac_address.to_string()));
    }
    if others.iter().any(|other| other.ip_address == mapping.ip_address) {
        return Err(conflict(server, "ipaddress", mapping.ip_address.to_string()));
    }
    Ok(())
}

fn conflict(server: &ServerName, field: &'static str, value: String) -> RouterDeskError {
    tracing::warn!(server = %server, field, value = %value, "rejected duplicate static mapping");
    ConflictError {
        entity: "StaticMapping",
        field,
        value,
    }
    .into()
}
