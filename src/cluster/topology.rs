//! Cluster membership and liveness

use std::collections::BTreeMap;

use tracing::debug;

use super::node::normalize_address;
use crate::client::ManagementConnection;
use crate::metrics::fallback::{decode, FallbackChain};
use crate::metrics::templates::paths;
use crate::utils::FetchError;

/// Member address → liveness, built once per poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTopology {
    members: BTreeMap<String, bool>,
}

impl ClusterTopology {
    /// Build from the full member list and the live list
    ///
    /// Members absent from `live` are down. A live entry missing from `all`
    /// is still recorded as a live member.
    pub fn from_members<A, L>(all: A, live: L) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        let mut members: BTreeMap<String, bool> = all
            .into_iter()
            .map(|addr| (normalize_address(addr.as_ref()), false))
            .collect();
        for addr in live {
            members.insert(normalize_address(addr.as_ref()), true);
        }
        Self { members }
    }

    /// Query the seed node's StorageService for membership
    ///
    /// Every error propagates; the caller decides whether the cycle survives.
    pub fn probe(conn: &mut dyn ManagementConnection) -> Result<Self, FetchError> {
        let live = conn_live_nodes(conn)?;

        let all = match all_members_chain().fetch(conn)? {
            Some(all) => all,
            None => {
                debug!("No host id map exposed; using live and unreachable lists");
                let unreachable = FallbackChain::single(
                    "unreachable nodes",
                    paths::UNREACHABLE_NODES,
                    decode::string_list,
                )
                .fetch(conn)?
                .unwrap_or_default();
                live.iter().cloned().chain(unreachable).collect()
            }
        };

        let topology = Self::from_members(all, live);
        debug!(
            "Topology: {} members, {} live",
            topology.len(),
            topology.num_live()
        );
        Ok(topology)
    }

    pub fn is_live(&self, address: &str) -> Option<bool> {
        self.members.get(address).copied()
    }

    /// Live member addresses in address order
    pub fn live_hosts(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|(_, live)| **live)
            .map(|(addr, _)| addr.as_str())
            .collect()
    }

    pub fn down_hosts(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|(_, live)| !**live)
            .map(|(addr, _)| addr.as_str())
            .collect()
    }

    /// (address, live) pairs in address order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.members.iter().map(|(addr, live)| (addr.as_str(), *live))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn num_live(&self) -> usize {
        self.members.values().filter(|live| **live).count()
    }

    pub fn num_down(&self) -> usize {
        self.len() - self.num_live()
    }
}

fn all_members_chain() -> FallbackChain<Vec<String>> {
    FallbackChain::single("cluster members", paths::HOST_ID_MAP, decode::map_keys)
        .or(paths::ENDPOINT_TO_HOST_ID, decode::map_keys)
}

fn conn_live_nodes(conn: &mut dyn ManagementConnection) -> Result<Vec<String>, FetchError> {
    decode::string_list(conn, &paths::LIVE_NODES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AttributeValue, FakeNode};

    #[test]
    fn test_from_members() {
        let topology = ClusterTopology::from_members(
            ["/10.0.0.1", "/10.0.0.2", "/10.0.0.3"],
            ["10.0.0.1", "10.0.0.3"],
        );
        assert_eq!(topology.len(), 3);
        assert_eq!(topology.live_hosts(), vec!["10.0.0.1", "10.0.0.3"]);
        assert_eq!(topology.down_hosts(), vec!["10.0.0.2"]);
        assert_eq!(topology.is_live("10.0.0.2"), Some(false));
        assert_eq!(topology.is_live("10.0.0.9"), None);
    }

    #[test]
    fn test_live_member_missing_from_all() {
        let topology = ClusterTopology::from_members(["10.0.0.1"], ["10.0.0.1", "10.0.0.2"]);
        assert_eq!(topology.num_live(), 2);
        assert_eq!(topology.num_down(), 0);
    }

    #[test]
    fn test_probe_host_id_map() {
        let mut conn = FakeNode::new()
            .with_topology(&["10.0.0.1", "10.0.0.2"], &["10.0.0.1"])
            .into_connection();
        let topology = ClusterTopology::probe(&mut conn).unwrap();
        assert_eq!(topology.live_hosts(), vec!["10.0.0.1"]);
        assert_eq!(topology.down_hosts(), vec!["10.0.0.2"]);
    }

    #[test]
    fn test_probe_endpoint_to_host_id() {
        let map = AttributeValue::Map(vec![
            ("10.0.0.1:7000".to_string(), AttributeValue::from("a")),
            ("10.0.0.2:7000".to_string(), AttributeValue::from("b")),
        ]);
        let mut conn = FakeNode::new()
            .with(paths::ENDPOINT_TO_HOST_ID, map)
            .with(paths::LIVE_NODES, AttributeValue::List(vec!["10.0.0.2".into()]))
            .into_connection();
        let topology = ClusterTopology::probe(&mut conn).unwrap();
        assert_eq!(topology.live_hosts(), vec!["10.0.0.2"]);
        assert_eq!(topology.down_hosts(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_probe_unreachable_fallback() {
        let mut conn = FakeNode::new()
            .with(paths::LIVE_NODES, AttributeValue::List(vec!["10.0.0.1".into()]))
            .with(
                paths::UNREACHABLE_NODES,
                AttributeValue::List(vec!["10.0.0.5".into()]),
            )
            .into_connection();
        let topology = ClusterTopology::probe(&mut conn).unwrap();
        assert_eq!(topology.is_live("10.0.0.5"), Some(false));
        assert_eq!(topology.is_live("10.0.0.1"), Some(true));
    }

    #[test]
    fn test_probe_without_live_list_fails() {
        let mut conn = FakeNode::new().into_connection();
        assert!(ClusterTopology::probe(&mut conn).is_err());
    }
}
