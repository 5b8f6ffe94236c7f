//! Cluster-wide failure and availability metrics
//!
//! Produced once per cycle from the topology and the seed connection, so
//! they are reported even when no member is live enough to be polled.

use super::fallback::{decode, FallbackChain};
use super::metric::{Metric, Unit};
use super::templates::catalog::number;
use super::templates::paths::{self, ClientOp};
use crate::client::ManagementConnection;
use crate::cluster::ClusterTopology;
use crate::utils::FetchError;

/// Node counts, per-member down flags and the seed's request failure view
///
/// Transport errors propagate; the caller treats them as fatal to the cycle.
pub fn cluster_failure_metrics(
    conn: &mut dyn ManagementConnection,
    topology: &ClusterTopology,
) -> Result<Vec<Metric>, FetchError> {
    let mut metrics = vec![
        Metric::global("Failures/Nodes/Live", Unit::Count, Some(topology.num_live() as f64)),
        Metric::global("Failures/Nodes/Down", Unit::Count, Some(topology.num_down() as f64)),
    ];

    for (host, live) in topology.iter() {
        let down = if live { 0.0 } else { 1.0 };
        metrics.push(Metric::for_host(host, "Failures/Down", Unit::Count, Some(down)));
    }

    for op in ClientOp::ALL {
        let rate = unavailables_rate_chain(op).fetch(conn)?;
        metrics.push(Metric::global(
            &format!("Failures/Unavailables/{}", op.label()),
            Unit::Rate,
            rate,
        ));
    }

    for op in ClientOp::ALL {
        let timeouts = number("timeouts", paths::timeouts(op)).fetch(conn)?;
        metrics.push(Metric::global(
            &format!("Failures/Timeouts/{}", op.label()),
            Unit::Count,
            timeouts,
        ));
    }

    Ok(metrics)
}

fn unavailables_rate_chain(op: ClientOp) -> FallbackChain<f64> {
    number("unavailables rate", paths::unavailables_one_minute_rate(op))
        .or(paths::unavailables_mean_rate(op), decode::number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeNode;

    fn value_of(metrics: &[Metric], name: &str) -> Option<f64> {
        metrics.iter().find(|m| m.name == name).and_then(|m| m.value)
    }

    #[test]
    fn test_counts_and_down_flags() {
        let topology = ClusterTopology::from_members(["10.0.0.1", "10.0.0.2"], ["10.0.0.1"]);
        let mut conn = FakeNode::cassandra_2x().into_connection();
        let metrics = cluster_failure_metrics(&mut conn, &topology).unwrap();

        assert_eq!(value_of(&metrics, "Cassandra/global/Failures/Nodes/Live"), Some(1.0));
        assert_eq!(value_of(&metrics, "Cassandra/global/Failures/Nodes/Down"), Some(1.0));
        assert_eq!(value_of(&metrics, "Cassandra/hosts/10.0.0.1/Failures/Down"), Some(0.0));
        assert_eq!(value_of(&metrics, "Cassandra/hosts/10.0.0.2/Failures/Down"), Some(1.0));
        assert_eq!(
            value_of(&metrics, "Cassandra/global/Failures/Unavailables/Reads"),
            Some(0.25)
        );
        assert_eq!(value_of(&metrics, "Cassandra/global/Failures/Timeouts/Writes"), Some(3.0));
    }

    #[test]
    fn test_mean_rate_fallback() {
        let topology = ClusterTopology::from_members(["10.0.0.1"], ["10.0.0.1"]);
        let mut conn = FakeNode::cassandra_2x()
            .without(paths::unavailables_one_minute_rate(ClientOp::Read))
            .into_connection();
        let metrics = cluster_failure_metrics(&mut conn, &topology).unwrap();
        assert_eq!(
            value_of(&metrics, "Cassandra/global/Failures/Unavailables/Reads"),
            Some(0.5)
        );
    }

    #[test]
    fn test_missing_seed_attributes_leave_counts() {
        let topology = ClusterTopology::from_members(["10.0.0.1", "10.0.0.2"], Vec::<String>::new());
        let mut conn = FakeNode::new().into_connection();
        let metrics = cluster_failure_metrics(&mut conn, &topology).unwrap();
        assert_eq!(value_of(&metrics, "Cassandra/global/Failures/Nodes/Down"), Some(2.0));
        assert_eq!(value_of(&metrics, "Cassandra/global/Failures/Timeouts/Reads"), None);
    }

    #[test]
    fn test_transport_error_propagates() {
        let topology = ClusterTopology::from_members(["10.0.0.1"], ["10.0.0.1"]);
        let mut conn = FakeNode::cassandra_2x()
            .failing(paths::timeouts(ClientOp::Write))
            .into_connection();
        assert!(cluster_failure_metrics(&mut conn, &topology).is_err());
    }
}
