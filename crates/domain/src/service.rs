//! Singleton router services configured through one form each.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RouterDeskError, ValidationError};
use crate::forwarding::{BlacklistConfig, DnsConfig};
use crate::pppoe::PppoeConfig;

/// Which singleton service a configuration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Dns,
    Blacklist,
    Pppoe,
}

impl ServiceKind {
    pub const ALL: [Self; 3] = [Self::Dns, Self::Blacklist, Self::Pppoe];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Blacklist => "blacklist",
            Self::Pppoe => "pppoe",
        }
    }

    /// Human readable title used in page headings.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Dns => "DNS Forwarding",
            Self::Blacklist => "DNS Blacklist",
            Self::Pppoe => "PPPoE Server",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dns" => Ok(Self::Dns),
            "blacklist" => Ok(Self::Blacklist),
            "pppoe" => Ok(Self::Pppoe),
            other => Err(ValidationError::InvalidField {
                field: "service",
                reason: format!("unknown service {other:?}"),
            }),
        }
    }
}

/// Stored settings of one singleton service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", content = "config", rename_all = "lowercase")]
pub enum ServiceSettings {
    Dns(DnsConfig),
    Blacklist(BlacklistConfig),
    Pppoe(PppoeConfig),
}

impl ServiceSettings {
    #[must_use]
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Dns(_) => ServiceKind::Dns,
            Self::Blacklist(_) => ServiceKind::Blacklist,
            Self::Pppoe(_) => ServiceKind::Pppoe,
        }
    }

    /// Check the invariants of the wrapped configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] from the wrapped config.
    pub fn validate(&self) -> Result<(), RouterDeskError> {
        match self {
            Self::Dns(config) | Self::Blacklist(config) => config.validate(),
            Self::Pppoe(config) => config.validate(),
        }
    }
}
