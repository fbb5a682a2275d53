//! Typed, user-chosen identifier newtypes.
//!
//! DHCP servers and static mappings are addressed by the names operators
//! type in, so identifiers are validated strings rather than generated ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_NAME_LEN: usize = 64;

fn is_valid_name(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_NAME_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

macro_rules! define_name {
    ($(#[doc = $doc:expr])* $name:ident, $field:literal) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Form field this identifier is entered in.
            pub const FIELD: &'static str = $field;

            /// Validate and wrap a name.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError`] when the value is empty, too long
            /// or contains characters outside `[A-Za-z0-9_.-]`.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(ValidationError::MissingField { field: $field });
                }
                if !is_valid_name(&value) {
                    return Err(ValidationError::InvalidName { field: $field });
                }
                Ok(Self(value))
            }

            /// Borrow the name.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_name!(
    /// Unique name of a [`DhcpServer`](crate::dhcp::DhcpServer).
    ServerName,
    "name"
);

define_name!(
    /// Identifier of a [`StaticMapping`](crate::dhcp::StaticMapping), unique within its server.
    MappingId,
    "id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_simple_names() {
        let name = ServerName::new("lan0").unwrap();
        assert_eq!(name.as_str(), "lan0");
        assert_eq!(name.to_string(), "lan0");
    }

    #[test]
    fn should_report_missing_field_when_empty() {
        assert_eq!(
            ServerName::new(""),
            Err(ValidationError::MissingField { field: "name" })
        );
        assert_eq!(
            MappingId::new(""),
            Err(ValidationError::MissingField { field: "id" })
        );
    }

    #[test]
    fn should_reject_whitespace_and_symbols() {
        assert!(ServerName::new("lan 0").is_err());
        assert!(MappingId::new("printer/1").is_err());
    }

    #[test]
    fn should_reject_names_longer_than_limit() {
        assert!(ServerName::new("a".repeat(65)).is_err());
        assert!(ServerName::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let id = MappingId::new("printer").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"printer\"");
        let parsed: MappingId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_reject_invalid_name_when_deserializing() {
        let result: Result<ServerName, _> = serde_json::from_str("\"bad name\"");
        assert!(result.is_err());
    }
}
