//! Daemon settings: an optional `routerdesk.toml` plus `ROUTERDESK_*`
//! environment overrides, checked before anything is wired.
//!
//! The interface list ends up as checkbox values in the DNS, blacklist and
//! PPPoE forms and is re-read from comma separated input, so names are held
//! to what survives that round trip.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File read when `ROUTERDESK_CONFIG` is unset.
const DEFAULT_PATH: &str = "routerdesk.toml";

/// Longest name the kernel accepts for a network interface.
const MAX_INTERFACE_NAME: usize = 15;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub interfaces: InterfacesConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// sqlx `SQLite` URL, `sqlite:<path>` or `sqlite::memory:`.
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub filter: String,
}

/// Interfaces offered as checkboxes by the service forms.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterfacesConfig {
    pub known: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:routerdesk.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "routerdeskd=info,routerdesk=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for InterfacesConfig {
    fn default() -> Self {
        Self {
            known: ["eth0", "eth1", "eth2", "switch0"].map(String::from).to_vec(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{var}={value:?} is not usable")]
    Override { var: &'static str, value: String },
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Config {
    /// Reads the file named by `ROUTERDESK_CONFIG` (default
    /// `routerdesk.toml`, optional) and applies the process environment.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed file, an unparsable override or
    /// settings the daemon cannot run with.
    pub fn load() -> Result<Self, ConfigError> {
        let env = |var: &str| std::env::var(var).ok();
        let path = env("ROUTERDESK_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from);
        let explicit = path != Path::new(DEFAULT_PATH);
        Self::resolve(&path, explicit, env)
    }

    fn resolve(
        path: &Path,
        required: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        config.override_from(env)?;
        config.check()?;
        Ok(config)
    }

    /// Applies `ROUTERDESK_*` values; `RUST_LOG` wins over `ROUTERDESK_LOG`.
    fn override_from(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(bind) = env("ROUTERDESK_BIND") {
            let (host, port) = bind
                .rsplit_once(':')
                .and_then(|(host, port)| Some((host, port.parse::<u16>().ok()?)))
                .ok_or_else(|| ConfigError::Override {
                    var: "ROUTERDESK_BIND",
                    value: bind.clone(),
                })?;
            self.server.host = host.to_string();
            self.server.port = port;
        }
        if let Some(host) = env("ROUTERDESK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env("ROUTERDESK_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::Override {
                var: "ROUTERDESK_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(url) = env("ROUTERDESK_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(list) = env("ROUTERDESK_INTERFACES") {
            self.interfaces.known = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(filter) = env("RUST_LOG").or_else(|| env("ROUTERDESK_LOG")) {
            self.logging.filter = filter;
        }
        Ok(())
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "must be between 1 and 65535"));
        }
        check_database_url(&self.database.url)?;
        let mut seen = BTreeSet::new();
        for name in &self.interfaces.known {
            check_interface_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(invalid("interfaces.known", format!("{name:?} is listed twice")));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_database_url(url: &str) -> Result<(), ConfigError> {
    match url.strip_prefix("sqlite:") {
        Some(rest) if !rest.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("database.url", "names no database file")),
        None => Err(invalid("database.url", format!("{url:?} is not a sqlite: URL"))),
    }
}

/// Names are submitted as form values and split on commas when typed in.
fn check_interface_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(invalid("interfaces.known", "interface name is empty"));
    }
    if name.len() > MAX_INTERFACE_NAME {
        return Err(invalid(
            "interfaces.known",
            format!("{name:?} is longer than {MAX_INTERFACE_NAME} bytes"),
        ));
    }
    if name.chars().any(|c| c.is_whitespace() || c == ',' || c == '/') {
        return Err(invalid(
            "interfaces.known",
            format!("{name:?} contains whitespace, ',' or '/'"),
        ));
    }
    Ok(())
}
