//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`RouterDeskError`] via `#[from]`.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

/// Top-level error returned by services and ports.
#[derive(Debug, thiserror::Error)]
pub enum RouterDeskError {
    /// Input rejected by a domain invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The addressed entity does not exist (anymore).
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The change collides with an existing entity.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// Another change to the same entity is still in flight.
    #[error(transparent)]
    Busy(#[from] BusyError),

    /// The backend could not serve the request (storage or network failure).
    #[error("backend unavailable")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RouterDeskError {
    /// Name of the input field the error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(err) => err.field(),
            Self::Conflict(err) => Some(err.field),
            Self::NotFound(_) | Self::Busy(_) | Self::Transport(_) => None,
        }
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("{field} may only contain letters, digits, '-', '_' and '.' (at most 64)")]
    InvalidName { field: &'static str },

    #[error("subnet {0} is not a network address")]
    SubnetNotNetworkAddress(Ipv4Network),

    #[error("subnet /{0} leaves no assignable addresses")]
    SubnetTooSmall(u8),

    #[error("range start and range stop must be set together")]
    IncompleteRange,

    #[error("range start {start} is after range stop {stop}")]
    InvertedRange { start: Ipv4Addr, stop: Ipv4Addr },

    #[error("{field} {addr} is outside subnet {subnet}")]
    OutsideSubnet {
        field: &'static str,
        addr: Ipv4Addr,
        subnet: Ipv4Network,
    },

    #[error("{field} {addr} is the network or broadcast address of {subnet}")]
    ReservedAddress {
        field: &'static str,
        addr: Ipv4Addr,
        subnet: Ipv4Network,
    },

    #[error("lease time must be a positive number of seconds")]
    ZeroLeaseTime,

    #[error("cache size must be positive")]
    ZeroCacheSize,

    #[error("at least one interface is required")]
    NoInterfaces,

    #[error("client range {start} - {stop} must stay within one /24")]
    RangeSpansSubnets { start: Ipv4Addr, stop: Ipv4Addr },

    #[error("MTU {0} is outside 576..=1500")]
    MtuOutOfRange(u16),
}

impl ValidationError {
    /// Name of the input field the violation refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidField { field, .. }
            | Self::InvalidName { field }
            | Self::OutsideSubnet { field, .. }
            | Self::ReservedAddress { field, .. } => Some(field),
            Self::SubnetNotNetworkAddress(_) | Self::SubnetTooSmall(_) => Some("subnet"),
            Self::IncompleteRange | Self::InvertedRange { .. } => Some("range-start"),
            Self::ZeroLeaseTime => Some("lease"),
            Self::ZeroCacheSize => Some("cache-size"),
            Self::NoInterfaces => Some("interface"),
            Self::RangeSpansSubnets { .. } => Some("client-ip-stop"),
            Self::MtuOutOfRange(_) => Some("mtu"),
        }
    }
}

/// Lookup of a missing entity.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Uniqueness violation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{entity} with {field} {value} already exists")]
pub struct ConflictError {
    pub entity: &'static str,
    pub field: &'static str,
    pub value: String,
}

/// A mutation was attempted while another one on the same entity is pending.
#[derive(Debug, Clone, thiserror::Error)]
#[error("another change to {key} is still in progress")]
pub struct BusyError {
    pub key: String,
}
