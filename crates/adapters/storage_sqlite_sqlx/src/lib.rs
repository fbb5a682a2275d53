//! # routerdesk-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `routerdesk-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `routerdesk-app` (for port traits) and `routerdesk-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod blocked_network_repo;
mod dhcp_server_repo;
mod error;
mod lease_repo;
mod mapping_repo;
mod pool;
mod service_config_repo;

pub use blocked_network_repo::SqliteBlockedNetworkRepository;
pub use dhcp_server_repo::SqliteDhcpServerRepository;
pub use error::StorageError;
pub use lease_repo::SqliteLeaseRepository;
pub use mapping_repo::SqliteStaticMappingRepository;
pub use pool::{Config, Database};
pub use service_config_repo::SqliteServiceConfigRepository;
