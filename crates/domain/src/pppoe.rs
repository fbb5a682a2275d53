//! PPPoE server settings.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{RouterDeskError, ValidationError};
use crate::net::AddressRange;

/// MTU values the PPPoE server accepts.
pub const MTU_RANGE: RangeInclusive<u16> = 576..=1500;

/// PPPoE access concentrator with RADIUS authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PppoeConfig {
    pub client_ip_start: Ipv4Addr,
    pub client_ip_stop: Ipv4Addr,
    pub radius_server_ip: Ipv4Addr,
    pub radius_server_key: String,
    pub mtu: Option<u16>,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
    pub interfaces: BTreeSet<String>,
}

impl PppoeConfig {
    /// The client address pool.
    #[must_use]
    pub fn client_range(&self) -> Option<AddressRange> {
        AddressRange::new(self.client_ip_start, self.client_ip_stop).ok()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] when the client range is
    /// inverted or spans more than one /24, the RADIUS key is blank, the MTU
    /// is out of range, or no interface is selected.
    pub fn validate(&self) -> Result<(), RouterDeskError> {
        let start = self.client_ip_start;
        let stop = self.client_ip_stop;
        AddressRange::new(start, stop)?;
        if start.octets()[..3] != stop.octets()[..3] {
            return Err(ValidationError::RangeSpansSubnets { start, stop }.into());
        }
        if self.radius_server_key.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "radius-server-key",
            }
            .into());
        }
        if let Some(mtu) = self.mtu.filter(|mtu| !MTU_RANGE.contains(mtu)) {
            return Err(ValidationError::MtuOutOfRange(mtu).into());
        }
        if self.interfaces.is_empty() {
            return Err(ValidationError::NoInterfaces.into());
        }
        Ok(())
    }
}
