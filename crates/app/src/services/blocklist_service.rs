//! Blocked networks: the IPv4 block list behind the DNS blacklist.

use ipnetwork::Ipv4Network;
use routerdesk_domain::blocklist::{NetworkDiff, extract_networks, merge};
use routerdesk_domain::error::{RouterDeskError, ValidationError};

use crate::ports::BlockedNetworkRepository;

/// Application service keeping the block list in line with a threat feed.
pub struct BlocklistService<R> {
    repo: R,
}

impl<R: BlockedNetworkRepository> BlocklistService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stored blocks, ordered by network.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self) -> Result<Vec<Ipv4Network>, RouterDeskError> {
        let mut networks = self.repo.get_all().await?;
        networks.sort_unstable();
        Ok(networks)
    }

    /// Replace the block list with the merged networks found in `feed`.
    ///
    /// A feed without a single network leaves the list untouched, so an
    /// empty or failed download never clears it.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Validation`] when `feed` names no IPv4
    /// network, or a storage error from the repository.
    pub async fn replace_from_feed(&self, feed: &str) -> Result<NetworkDiff, RouterDeskError> {
        let found = extract_networks(feed);
        if found.is_empty() {
            tracing::warn!(bytes = feed.len(), "blocklist feed holds no networks");
            return Err(ValidationError::InvalidField {
                field: "networks",
                reason: "feed holds no IPv4 network".to_string(),
            }
            .into());
        }
        let incoming = merge(found);
        let current = self.repo.get_all().await?;
        let diff = NetworkDiff::between(&current, &incoming);
        if !diff.is_unchanged() {
            self.repo.apply(&diff).await?;
        }
        tracing::info!(
            added = diff.added.len(),
            same = diff.same.len(),
            deleted = diff.deleted.len(),
            "blocked networks updated"
        );
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryBlockedNetworkRepo;

    fn nets(list: &[&str]) -> Vec<Ipv4Network> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn should_store_merged_networks_when_feed_has_adjacent_blocks() {
        let svc = BlocklistService::new(InMemoryBlockedNetworkRepo::default());
        let diff = svc
            .replace_from_feed("192.0.2.0/25\n192.0.2.128/25\n203.0.113.9\n")
            .await
            .unwrap();
        assert_eq!(diff.added, nets(&["192.0.2.0/24", "203.0.113.9/32"]));
        assert!(diff.deleted.is_empty());
        assert_eq!(svc.list().await.unwrap(), nets(&["192.0.2.0/24", "203.0.113.9/32"]));
    }

    #[tokio::test]
    async fn should_report_dropped_and_kept_blocks_when_feed_changes() {
        let svc = BlocklistService::new(InMemoryBlockedNetworkRepo::default());
        svc.replace_from_feed("192.0.2.0/24 203.0.113.9").await.unwrap();

        let diff = svc
            .replace_from_feed("192.0.2.0/24 198.51.100.0/24")
            .await
            .unwrap();
        assert_eq!(diff.added, nets(&["198.51.100.0/24"]));
        assert_eq!(diff.deleted, nets(&["203.0.113.9/32"]));
        assert_eq!(diff.same, nets(&["192.0.2.0/24"]));
        assert_eq!(svc.list().await.unwrap(), nets(&["192.0.2.0/24", "198.51.100.0/24"]));
    }

    #[tokio::test]
    async fn should_keep_list_when_feed_holds_no_network() {
        let repo = InMemoryBlockedNetworkRepo::default();
        let svc = BlocklistService::new(repo.clone());
        svc.replace_from_feed("192.0.2.0/24").await.unwrap();

        let err = svc.replace_from_feed("<html>503</html>").await.unwrap_err();
        assert_eq!(err.field(), Some("networks"));
        assert_eq!(svc.list().await.unwrap(), nets(&["192.0.2.0/24"]));
    }

    #[tokio::test]
    async fn should_skip_write_when_feed_is_unchanged() {
        let repo = InMemoryBlockedNetworkRepo::default();
        let svc = BlocklistService::new(repo.clone());
        svc.replace_from_feed("192.0.2.0/24").await.unwrap();
        let calls = repo.tracker.calls();

        let diff = svc.replace_from_feed("192.0.2.0/24").await.unwrap();
        assert!(diff.is_unchanged());
        assert_eq!(repo.tracker.calls(), calls + 1);
    }
}
