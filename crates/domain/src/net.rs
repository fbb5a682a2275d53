//! Network value objects shared by the DHCP and PPPoE models.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A 48-bit IEEE 802 MAC address.
///
/// Parses `aa:bb:cc:dd:ee:ff` and `aa-bb-cc-dd-ee-ff` (any case) and
/// always displays lowercase and colon separated, so equal addresses
/// compare equal regardless of how they were typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    #[must_use]
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    #[must_use]
    pub const fn octets(self) -> [u8; 6] {
        self.0
    }
}

/// Error returned when a string is not a MAC address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} is not a MAC address (expected aa:bb:cc:dd:ee:ff)")]
pub struct MacParseError(String);

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let separator = if trimmed.contains('-') { '-' } else { ':' };
        let mut octets = [0u8; 6];
        let mut parts = trimmed.split(separator);
        for octet in &mut octets {
            let part = parts
                .next()
                .filter(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_hexdigit()))
                .ok_or_else(|| MacParseError(s.to_string()))?;
            *octet = u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(MacParseError(s.to_string()));
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An inclusive range of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: Ipv4Addr,
    stop: Ipv4Addr,
}

impl AddressRange {
    /// Build a range, rejecting `start > stop`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedRange`] when `start` comes after `stop`.
    pub fn new(start: Ipv4Addr, stop: Ipv4Addr) -> Result<Self, ValidationError> {
        if start > stop {
            return Err(ValidationError::InvertedRange { start, stop });
        }
        Ok(Self { start, stop })
    }

    #[must_use]
    pub fn start(self) -> Ipv4Addr {
        self.start
    }

    #[must_use]
    pub fn stop(self) -> Ipv4Addr {
        self.stop
    }

    /// Number of addresses in the range, both ends included.
    #[must_use]
    pub fn size(self) -> u32 {
        u32::from(self.stop) - u32::from(self.start) + 1
    }

    #[must_use]
    pub fn contains(self, addr: Ipv4Addr) -> bool {
        self.start <= addr && addr <= self.stop
    }
}

/// Check that `addr` is an assignable host address of `subnet`.
///
/// # Errors
///
/// Returns [`ValidationError::OutsideSubnet`] or
/// [`ValidationError::ReservedAddress`] naming `field`.
pub fn ensure_host_address(
    field: &'static str,
    addr: Ipv4Addr,
    subnet: Ipv4Network,
) -> Result<(), ValidationError> {
    if !subnet.contains(addr) {
        return Err(ValidationError::OutsideSubnet {
            field,
            addr,
            subnet,
        });
    }
    if subnet.prefix() < 31 && (addr == subnet.network() || addr == subnet.broadcast()) {
        return Err(ValidationError::ReservedAddress {
            field,
            addr,
            subnet,
        });
    }
    Ok(())
}

/// Parse an IPv4 address typed into `field`.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] for blank input and
/// [`ValidationError::InvalidField`] for anything that is not a dotted quad.
pub fn parse_ipv4(field: &'static str, raw: &str) -> Result<Ipv4Addr, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    raw.parse().map_err(|_| ValidationError::InvalidField {
        field,
        reason: format!("{raw:?} is not an IPv4 address"),
    })
}

/// Parse an optional IPv4 address; blank input yields `None`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidField`] for non-blank, malformed input.
pub fn parse_optional_ipv4(
    field: &'static str,
    raw: &str,
) -> Result<Option<Ipv4Addr>, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_ipv4(field, raw).map(Some)
}

/// Parse a subnet in CIDR notation typed into `field`.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] for blank input and
/// [`ValidationError::InvalidField`] when the text is not `a.b.c.d/len`.
pub fn parse_subnet(field: &'static str, raw: &str) -> Result<Ipv4Network, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    if !raw.contains('/') {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("{raw:?} lacks a prefix length, e.g. 192.0.2.0/24"),
        });
    }
    raw.parse().map_err(|_| ValidationError::InvalidField {
        field,
        reason: format!("{raw:?} is not an IPv4 subnet"),
    })
}

/// Parse a MAC address typed into `field`.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] for blank input and
/// [`ValidationError::InvalidField`] for malformed input.
pub fn parse_mac(field: &'static str, raw: &str) -> Result<MacAddress, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    raw.parse::<MacAddress>()
        .map_err(|err| ValidationError::InvalidField {
            field,
            reason: err.to_string(),
        })
}
