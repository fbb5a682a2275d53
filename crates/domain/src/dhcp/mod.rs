//! DHCP server domain: servers, static MAC/IP mappings, observed leases and
//! the pool arithmetic shown next to them.

mod lease;
mod mapping;
mod pool;
mod server;

pub use lease::Lease;
pub use mapping::StaticMapping;
pub use pool::PoolStats;
pub use server::{DEFAULT_LEASE_SECONDS, DhcpServer, DhcpServerBuilder};
