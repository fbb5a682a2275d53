//! Static MAC → IP binding within a DHCP server.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::dhcp::DhcpServer;
use crate::error::RouterDeskError;
use crate::id::MappingId;
use crate::net::{MacAddress, ensure_host_address};

/// A fixed address reservation for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMapping {
    pub id: MappingId,
    pub mac_address: MacAddress,
    pub ip_address: Ipv4Addr,
}

impl StaticMapping {
    #[must_use]
    pub fn new(id: MappingId, mac_address: MacAddress, ip_address: Ipv4Addr) -> Self {
        Self {
            id,
            mac_address,
            ip_address,
        }
    }

    /// Check that the mapping fits the server it belongs to.
    ///
    /// Uniqueness against sibling mappings is enforced by the service layer.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] when the address is not an
    /// assignable host of the server subnet.
    pub fn validate_for(&self, server: &DhcpServer) -> Result<(), RouterDeskError> {
        ensure_host_address("ipaddress", self.ip_address, server.subnet)?;
        Ok(())
    }
}
