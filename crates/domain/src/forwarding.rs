//! DNS forwarding and DNS blacklist settings.
//!
//! Both services share one shape: a query cache size and the set of
//! interfaces the forwarder listens on.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RouterDeskError, ValidationError};

/// Cache size applied when none is given.
pub const DEFAULT_CACHE_SIZE: u32 = 150;

/// An interface chosen from the router's interface list, or typed in freely.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum InterfaceSelection {
    Known(String),
    Other(String),
}

impl InterfaceSelection {
    /// Classify `name` against the interfaces the router reports.
    #[must_use]
    pub fn classify(name: &str, known: &[String]) -> Self {
        let name = name.trim().to_string();
        if known.iter().any(|k| *k == name) {
            Self::Known(name)
        } else {
            Self::Other(name)
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Known(name) | Self::Other(name) => name,
        }
    }
}

impl fmt::Display for InterfaceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings of a DNS forwarder (plain forwarding or blacklist).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingConfig {
    pub cache_size: u32,
    pub interfaces: BTreeSet<InterfaceSelection>,
}

/// DNS forwarding settings.
pub type DnsConfig = ForwardingConfig;

/// DNS blacklist settings.
pub type BlacklistConfig = ForwardingConfig;

impl ForwardingConfig {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] when the cache size is zero,
    /// no interface is selected, or an interface name is blank.
    pub fn validate(&self) -> Result<(), RouterDeskError> {
        if self.cache_size == 0 {
            return Err(ValidationError::ZeroCacheSize.into());
        }
        if self.interfaces.is_empty() {
            return Err(ValidationError::NoInterfaces.into());
        }
        if self.interfaces.iter().any(|i| i.name().is_empty()) {
            return Err(ValidationError::InvalidField {
                field: "interface",
                reason: "interface name must not be blank".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
