//! Lease: an address handed out by the DHCP daemon.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::dhcp::DhcpServer;
use crate::error::{RouterDeskError, ValidationError};
use crate::id::ServerName;
use crate::net::MacAddress;
use crate::time::Timestamp;

/// A dynamic IP ↔ MAC binding reported by the daemon.
///
/// Leases are observed, never edited. They can be promoted to a
/// [`StaticMapping`](crate::dhcp::StaticMapping).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub ip_address: Ipv4Addr,
    pub mac_address: MacAddress,
    pub expiration: Timestamp,
    pub pool: ServerName,
    pub hostname: Option<String>,
}

impl Lease {
    /// Whether the lease still holds its address at `now`.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expiration > now
    }

    /// Check that the lease belongs to `server`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] when the pool name differs or
    /// the address lies outside the server subnet.
    pub fn validate_for(&self, server: &DhcpServer) -> Result<(), RouterDeskError> {
        if self.pool != server.name {
            return Err(ValidationError::InvalidField {
                field: "pool",
                reason: format!("lease belongs to {}, not {}", self.pool, server.name),
            }
            .into());
        }
        if !server.subnet.contains(self.ip_address) {
            return Err(ValidationError::OutsideSubnet {
                field: "ipaddress",
                addr: self.ip_address,
                subnet: server.subnet,
            }
            .into());
        }
        Ok(())
    }
}
