//! Pool counters displayed for each DHCP server.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::dhcp::{DhcpServer, Lease, StaticMapping};
use crate::time::Timestamp;

/// Address usage of one DHCP server.
///
/// `leased + available <= pool_size` always holds: an address taken by an
/// active lease and by a static mapping is only subtracted once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Addresses in the dynamic range.
    pub pool_size: u32,
    /// Active leases inside the dynamic range.
    pub leased: u32,
    /// Range addresses neither leased nor reserved by a static mapping.
    pub available: u32,
    /// Static mappings, counted independently of the range.
    pub static_count: u32,
}

impl PoolStats {
    /// Compute counters from the server definition and the observed state.
    #[must_use]
    pub fn compute(
        server: &DhcpServer,
        leases: &[Lease],
        mappings: &[StaticMapping],
        now: Timestamp,
    ) -> Self {
        let static_count = saturating_u32(mappings.len());
        let Some(range) = server.range() else {
            return Self {
                static_count,
                ..Self::default()
            };
        };

        let leased: HashSet<Ipv4Addr> = leases
            .iter()
            .filter(|lease| lease.is_active(now) && range.contains(lease.ip_address))
            .map(|lease| lease.ip_address)
            .collect();
        let mut taken = leased.clone();
        taken.extend(
            mappings
                .iter()
                .map(|mapping| mapping.ip_address)
                .filter(|ip| range.contains(*ip)),
        );

        let pool_size = range.size();
        Self {
            pool_size,
            leased: saturating_u32(leased.len()),
            available: pool_size.saturating_sub(saturating_u32(taken.len())),
            static_count,
        }
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
