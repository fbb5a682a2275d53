//! DHCP server: one shared network with an optional dynamic pool.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::error::{RouterDeskError, ValidationError};
use crate::id::ServerName;
use crate::net::{AddressRange, ensure_host_address};

/// Lease time applied when none is given: one day.
pub const DEFAULT_LEASE_SECONDS: u32 = 86_400;

/// A DHCPv4 server serving one subnet.
///
/// Without `range_start`/`range_stop` the server only hands out addresses
/// through static mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpServer {
    pub name: ServerName,
    pub subnet: Ipv4Network,
    pub range_start: Option<Ipv4Addr>,
    pub range_stop: Option<Ipv4Addr>,
    pub router: Option<Ipv4Addr>,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
    pub unifi_controller: Option<Ipv4Addr>,
    pub domain: Option<String>,
    pub lease_seconds: u32,
    pub enabled: bool,
}

impl DhcpServer {
    /// Create a builder for constructing a [`DhcpServer`].
    #[must_use]
    pub fn builder() -> DhcpServerBuilder {
        DhcpServerBuilder::default()
    }

    /// The dynamic pool, if one is configured and well-formed.
    #[must_use]
    pub fn range(&self) -> Option<AddressRange> {
        match (self.range_start, self.range_stop) {
            (Some(start), Some(stop)) => AddressRange::new(start, stop).ok(),
            _ => None,
        }
    }

    /// Number of dynamically assignable addresses; 0 for static-only servers.
    #[must_use]
    pub fn pool_size(&self) -> u32 {
        self.range().map_or(0, AddressRange::size)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] when the subnet is not a
    /// network address or too small, the range is incomplete, inverted or
    /// outside the subnet, the router is outside the subnet, or the lease
    /// time is zero.
    pub fn validate(&self) -> Result<(), RouterDeskError> {
        if self.subnet.ip() != self.subnet.network() {
            return Err(ValidationError::SubnetNotNetworkAddress(self.subnet).into());
        }
        if self.subnet.prefix() > 30 {
            return Err(ValidationError::SubnetTooSmall(self.subnet.prefix()).into());
        }
        match (self.range_start, self.range_stop) {
            (Some(start), Some(stop)) => {
                ensure_host_address("range-start", start, self.subnet)?;
                ensure_host_address("range-stop", stop, self.subnet)?;
                AddressRange::new(start, stop)?;
            }
            (None, None) => {}
            _ => return Err(ValidationError::IncompleteRange.into()),
        }
        if let Some(router) = self.router {
            ensure_host_address("router", router, self.subnet)?;
        }
        if self.domain.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(ValidationError::InvalidField {
                field: "domain",
                reason: "must not be blank".to_string(),
            }
            .into());
        }
        if self.lease_seconds == 0 {
            return Err(ValidationError::ZeroLeaseTime.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`DhcpServer`].
#[derive(Debug)]
pub struct DhcpServerBuilder {
    name: Option<ServerName>,
    subnet: Option<Ipv4Network>,
    range_start: Option<Ipv4Addr>,
    range_stop: Option<Ipv4Addr>,
    router: Option<Ipv4Addr>,
    dns1: Option<Ipv4Addr>,
    dns2: Option<Ipv4Addr>,
    unifi_controller: Option<Ipv4Addr>,
    domain: Option<String>,
    lease_seconds: u32,
    enabled: bool,
}

impl Default for DhcpServerBuilder {
    fn default() -> Self {
        Self {
            name: None,
            subnet: None,
            range_start: None,
            range_stop: None,
            router: None,
            dns1: None,
            dns2: None,
            unifi_controller: None,
            domain: None,
            lease_seconds: DEFAULT_LEASE_SECONDS,
            enabled: true,
        }
    }
}

impl DhcpServerBuilder {
    #[must_use]
    pub fn name(mut self, name: ServerName) -> Self {
        self.name = Some(name);
        self
    }

    #[must_use]
    pub fn subnet(mut self, subnet: Ipv4Network) -> Self {
        self.subnet = Some(subnet);
        self
    }

    #[must_use]
    pub fn range(mut self, start: Ipv4Addr, stop: Ipv4Addr) -> Self {
        self.range_start = Some(start);
        self.range_stop = Some(stop);
        self
    }

    #[must_use]
    pub fn range_start(mut self, start: Option<Ipv4Addr>) -> Self {
        self.range_start = start;
        self
    }

    #[must_use]
    pub fn range_stop(mut self, stop: Option<Ipv4Addr>) -> Self {
        self.range_stop = stop;
        self
    }

    #[must_use]
    pub fn router(mut self, router: Option<Ipv4Addr>) -> Self {
        self.router = router;
        self
    }

    #[must_use]
    pub fn dns(mut self, dns1: Option<Ipv4Addr>, dns2: Option<Ipv4Addr>) -> Self {
        self.dns1 = dns1;
        self.dns2 = dns2;
        self
    }

    #[must_use]
    pub fn unifi_controller(mut self, controller: Option<Ipv4Addr>) -> Self {
        self.unifi_controller = controller;
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    #[must_use]
    pub fn lease_seconds(mut self, seconds: u32) -> Self {
        self.lease_seconds = seconds;
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Consume the builder, validate, and return a [`DhcpServer`].
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] if `name` or `subnet` is
    /// missing or any invariant of [`DhcpServer::validate`] fails.
    pub fn build(self) -> Result<DhcpServer, RouterDeskError> {
        let name = self
            .name
            .ok_or(ValidationError::MissingField { field: "name" })?;
        let subnet = self
            .subnet
            .ok_or(ValidationError::MissingField { field: "subnet" })?;
        let server = DhcpServer {
            name,
            subnet,
            range_start: self.range_start,
            range_stop: self.range_stop,
            router: self.router,
            dns1: self.dns1,
            dns2: self.dns2,
            unifi_controller: self.unifi_controller,
            domain: self.domain,
            lease_seconds: self.lease_seconds,
            enabled: self.enabled,
        };
        server.validate()?;
        Ok(server)
    }
}
