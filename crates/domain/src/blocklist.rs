//! IPv4 networks blocked by the DNS blacklist, fed from threat lists.
//!
//! A feed is free text: every dotted quad, with or without a prefix length,
//! names a network. The stored list is the smallest set of CIDR blocks that
//! covers exactly the fed addresses.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

/// Every IPv4 network mentioned in `text`, host bits cleared.
///
/// Tokens that are not a four-octet address with an optional `/prefix` are
/// skipped.
#[must_use]
pub fn extract_networks(text: &str) -> BTreeSet<Ipv4Network> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '/'))
        .filter_map(parse_token)
        .collect()
}

fn parse_token(token: &str) -> Option<Ipv4Network> {
    let token = token.trim_matches(|c| c == '.' || c == '/');
    let parsed: Ipv4Network = token.parse().ok()?;
    Ipv4Network::new(parsed.network(), parsed.prefix()).ok()
}

/// Collapses `networks` into the fewest CIDR blocks covering the same
/// addresses, in ascending order. Contained, overlapping and adjacent
/// blocks fold together.
#[must_use]
pub fn merge(networks: impl IntoIterator<Item = Ipv4Network>) -> Vec<Ipv4Network> {
    let mut spans: Vec<(u32, u32)> = networks
        .into_iter()
        .map(|net| (u32::from(net.network()), u32::from(net.broadcast())))
        .collect();
    spans.sort_unstable();

    let mut joined: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match joined.last_mut() {
            Some((_, last)) if start <= last.saturating_add(1) => *last = (*last).max(end),
            _ => joined.push((start, end)),
        }
    }

    joined
        .into_iter()
        .flat_map(|(start, end)| cover(start, end))
        .collect()
}

/// Largest aligned blocks tiling `start..=end`.
fn cover(start: u32, end: u32) -> Vec<Ipv4Network> {
    let end = u64::from(end);
    let mut next = u64::from(start);
    let mut blocks = Vec::new();
    while next <= end {
        let mut bits = next.trailing_zeros().min(32);
        while next + (1u64 << bits) - 1 > end {
            bits -= 1;
        }
        let (Ok(addr), Ok(prefix)) = (u32::try_from(next), u8::try_from(32 - bits)) else {
            break;
        };
        if let Ok(block) = Ipv4Network::new(Ipv4Addr::from(addr), prefix) {
            blocks.push(block);
        }
        next += 1u64 << bits;
    }
    blocks
}

/// What replacing the stored block list with a new one changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDiff {
    /// In the new list only.
    pub added: Vec<Ipv4Network>,
    /// In the stored list only.
    pub deleted: Vec<Ipv4Network>,
    /// In both.
    pub same: Vec<Ipv4Network>,
}

impl NetworkDiff {
    #[must_use]
    pub fn between(current: &[Ipv4Network], incoming: &[Ipv4Network]) -> Self {
        let current: BTreeSet<Ipv4Network> = current.iter().copied().collect();
        let incoming: BTreeSet<Ipv4Network> = incoming.iter().copied().collect();
        Self {
            added: incoming.difference(&current).copied().collect(),
            deleted: current.difference(&incoming).copied().collect(),
            same: incoming.intersection(&current).copied().collect(),
        }
    }

    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nets(list: &[&str]) -> Vec<Ipv4Network> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn should_extract_networks_when_feed_mixes_text() {
        let feed = "# Emerging Threats block list\n\
                    192.0.2.7\n\
                    198.51.100.0/24 ; spamhaus\n\
                    ExitAddress 203.0.113.9 2024-05-01 10:00:00\n";
        let found: Vec<_> = extract_networks(feed).into_iter().collect();
        assert_eq!(
            found,
            nets(&["192.0.2.7/32", "198.51.100.0/24", "203.0.113.9/32"])
        );
    }

    #[test]
    fn should_skip_tokens_when_not_a_full_address() {
        let feed = "version 2.0 updated 2024-05-01, 10.1.2 and 10.0.0.0/40 and 300.1.1.1";
        assert!(extract_networks(feed).is_empty());
    }

    #[test]
    fn should_clear_host_bits_when_block_is_written_with_host_address() {
        let found: Vec<_> = extract_networks("198.51.100.77/24").into_iter().collect();
        assert_eq!(found, nets(&["198.51.100.0/24"]));
    }

    #[test]
    fn should_fold_blocks_when_adjacent_or_contained() {
        let merged = merge(nets(&[
            "192.0.2.0/25",
            "192.0.2.128/25",
            "192.0.2.9/32",
            "198.51.100.0/24",
            "198.51.100.64/26",
        ]));
        assert_eq!(merged, nets(&["192.0.2.0/24", "198.51.100.0/24"]));
    }

    #[test]
    fn should_split_run_into_aligned_blocks_when_not_a_power_of_two() {
        let merged = merge(nets(&["192.0.2.1/32", "192.0.2.2/31", "192.0.2.4/32"]));
        assert_eq!(merged, nets(&["192.0.2.1/32", "192.0.2.2/31", "192.0.2.4/32"]));

        let merged = merge(nets(&["192.0.2.0/32", "192.0.2.1/32", "192.0.2.2/31"]));
        assert_eq!(merged, nets(&["192.0.2.0/30"]));
    }

    #[test]
    fn should_cover_whole_space_when_halves_are_fed() {
        let merged = merge(nets(&["0.0.0.0/1", "128.0.0.0/1"]));
        assert_eq!(merged, nets(&["0.0.0.0/0"]));
        assert_eq!(merge(nets(&["255.255.255.255/32"])), nets(&["255.255.255.255/32"]));
    }

    #[test]
    fn should_split_into_added_deleted_and_same_when_lists_differ() {
        let current = nets(&["192.0.2.0/24", "203.0.113.5/32"]);
        let incoming = nets(&["192.0.2.0/24", "198.51.100.0/24"]);
        let diff = NetworkDiff::between(&current, &incoming);
        assert_eq!(diff.added, nets(&["198.51.100.0/24"]));
        assert_eq!(diff.deleted, nets(&["203.0.113.5/32"]));
        assert_eq!(diff.same, nets(&["192.0.2.0/24"]));
        assert!(!diff.is_unchanged());
        assert!(NetworkDiff::between(&current, &current).is_unchanged());
    }
}
