//! # routerdesk-app
//!
//! Application layer: use-cases, **port definitions** (traits) and the
//! **view-model layer** the dashboard renders.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DhcpServerRepository`: CRUD for DHCP servers
//!   - `StaticMappingRepository`: CRUD for static mappings, scoped by server
//!   - `LeaseRepository`: leases reported by the DHCP daemon
//!   - `ServiceConfigRepository`: DNS, blacklist and PPPoE settings
//!   - `BlockedNetworkRepository`: networks blocked by the DNS blacklist
//! - Define the **backend contract** (`ConfigBackend`) the views talk to, and
//!   implement it in-process (`AdminBackend`)
//! - Provide **use-case services** enforcing uniqueness and existence rules
//! - Provide the **view models**: entity tables, entity forms, the DHCP
//!   server dialog, and the view session (selection, stale-response
//!   detection, one in-flight mutation per entity)
//!
//! ## Dependency rule
//! Depends on `routerdesk-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod backend;
pub mod guard;
pub mod ports;
pub mod services;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;
