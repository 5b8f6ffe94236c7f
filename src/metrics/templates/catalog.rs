//! Cassandra metric catalog
//!
//! Four derivation groups (latency, system, storage, cache) run one after
//! another against the same connection. A group that hits a transport error
//! loses its remaining metrics, but the other groups still run. Inside a
//! group an unreadable attribute only blanks its own metric.
//!
//! Global twins (`Cassandra/global/...`) carry the value of the host that
//! produced them. When several hosts are polled the last one wins; this is
//! not an aggregate.

use tracing::warn;

use super::paths::{self, CacheKind, ClientOp};
use super::{MetricTemplate, VersionFamily};
use crate::client::{AttributePath, ManagementConnection};
use crate::metrics::fallback::{decode, FallbackChain};
use crate::metrics::metric::{Metric, Unit};
use crate::metrics::units::{to_millis, TimeUnit};
use crate::utils::FetchError;

/// Cumulative latency counters are kept in microseconds
const MICROS_TO_MILLIS: f64 = 0.001;

type Group = fn(&CatalogTemplate, &mut dyn ManagementConnection) -> Result<Vec<Metric>, FetchError>;

/// Catalog for one host of a given release family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTemplate {
    family: VersionFamily,
    host: String,
}

impl CatalogTemplate {
    const GROUPS: [(&'static str, Group); 4] = [
        ("latency", CatalogTemplate::latency_metrics),
        ("system", CatalogTemplate::system_metrics),
        ("storage", CatalogTemplate::storage_metrics),
        ("cache", CatalogTemplate::cache_metrics),
    ];

    pub fn new(family: VersionFamily, host: &str) -> Self {
        Self {
            family,
            host: host.to_string(),
        }
    }

    /// Per-host metric plus its global twin, same value
    fn twin(&self, measurement: &str, unit: Unit, value: Option<f64>) -> [Metric; 2] {
        [
            Metric::for_host(&self.host, measurement, unit, value),
            Metric::global(measurement, unit, value),
        ]
    }

    fn host_metric(&self, measurement: &str, unit: Unit, value: Option<f64>) -> Metric {
        Metric::for_host(&self.host, measurement, unit, value)
    }

    /// Mean latency, timeouts, cumulative latency and unavailable rate per operation
    pub fn latency_metrics(
        &self,
        conn: &mut dyn ManagementConnection,
    ) -> Result<Vec<Metric>, FetchError> {
        let mut metrics = Vec::new();

        for op in ClientOp::ALL {
            let mean = number("latency mean", paths::latency_mean(op)).fetch(conn)?;
            let unit = latency_unit_chain(self.family, op).fetch(conn)?;
            let millis = mean.zip(unit).map(|(value, unit)| to_millis(value, unit));
            metrics.extend(self.twin(&format!("Latency/{}", op.label()), Unit::Millis, millis));
        }

        for op in ClientOp::ALL {
            let timeouts = number("timeouts", paths::timeouts(op)).fetch(conn)?;
            metrics.push(self.host_metric(&format!("Timeouts/{}", op.label()), Unit::Count, timeouts));
        }

        for op in ClientOp::ALL {
            let total = number("total latency", paths::total_latency(op)).fetch(conn)?;
            metrics.push(self.host_metric(
                &format!("LatencyTotal/{}", op.label()),
                Unit::Millis,
                total.map(|micros| micros * MICROS_TO_MILLIS),
            ));
        }

        for op in ClientOp::ALL {
            let rate = number("unavailables", paths::unavailables_mean_rate(op)).fetch(conn)?;
            let unit = unavailables_unit_chain(op).fetch(conn)?;
            metrics.push(self.host_metric(
                &format!("Unavailables/{}", op.label()),
                Unit::Millis,
                rate.zip(unit).map(|(value, unit)| to_millis(value, unit)),
            ));
        }

        Ok(metrics)
    }

    /// Pending compaction and memtable flush tasks
    pub fn system_metrics(
        &self,
        conn: &mut dyn ManagementConnection,
    ) -> Result<Vec<Metric>, FetchError> {
        let compaction = number("compaction pending", paths::COMPACTION_PENDING).fetch(conn)?;
        let flush = memtable_flush_chain(self.family).fetch(conn)?;

        Ok(vec![
            self.host_metric("Compaction/PendingTasks", Unit::Count, compaction),
            self.host_metric("MemtableFlush/PendingTasks", Unit::Count, flush),
        ])
    }

    /// Live data size and commit log size
    pub fn storage_metrics(
        &self,
        conn: &mut dyn ManagementConnection,
    ) -> Result<Vec<Metric>, FetchError> {
        let load = load_chain().fetch(conn)?;
        let commit_log = commit_log_chain(self.family).fetch(conn)?;

        let mut metrics = Vec::with_capacity(4);
        metrics.extend(self.twin("Storage/Data", Unit::Bytes, load));
        metrics.extend(self.twin("Storage/CommitLog", Unit::Bytes, commit_log));
        Ok(metrics)
    }

    /// Hit rate, size, entries and request rate of the key and row caches
    pub fn cache_metrics(
        &self,
        conn: &mut dyn ManagementConnection,
    ) -> Result<Vec<Metric>, FetchError> {
        let mut metrics = Vec::new();

        for kind in CacheKind::ALL {
            let prefix = format!("Cache/{}", kind.scope());

            let hit_rate = number("cache hit rate", paths::cache_hit_rate(kind)).fetch(conn)?;
            metrics.extend(self.twin(&format!("{}/HitRate", prefix), Unit::Rate, hit_rate));

            let size = number("cache size", paths::cache_size(kind)).fetch(conn)?;
            metrics.extend(self.twin(&format!("{}/Size", prefix), Unit::Bytes, size));

            let entries = number("cache entries", paths::cache_entries(kind)).fetch(conn)?;
            metrics.extend(self.twin(&format!("{}/Entries", prefix), Unit::Count, entries));

            let requests = number("cache requests", paths::cache_requests(kind)).fetch(conn)?;
            metrics.push(self.host_metric(&format!("{}/Requests", prefix), Unit::Rate, requests));
        }

        Ok(metrics)
    }
}

impl MetricTemplate for CatalogTemplate {
    fn family(&self) -> VersionFamily {
        self.family
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn collect(&self, conn: &mut dyn ManagementConnection) -> Vec<Metric> {
        let mut metrics = Vec::new();
        for (name, group) in Self::GROUPS {
            match group(self, conn) {
                Ok(group_metrics) => metrics.extend(group_metrics),
                Err(e) if e.is_host_fatal() => {
                    warn!("Abandoning {} at {} metrics: {}", self.host, name, e);
                    break;
                }
                Err(e) => warn!("Skipping {} metrics for {}: {}", name, self.host, e),
            }
        }
        metrics
    }
}

pub(crate) fn number(label: &'static str, path: AttributePath) -> FallbackChain<f64> {
    FallbackChain::single(label, path, decode::number)
}

/// Unit of the client request latency histogram
///
/// 2.x publishes `LatencyUnit`, 3.x onwards `DurationUnit`; failing both the
/// decorated `RateUnit` string is reduced to its time unit.
fn latency_unit_chain(family: VersionFamily, op: ClientOp) -> FallbackChain<TimeUnit> {
    let (first, second) = match family {
        VersionFamily::Cassandra2x => (paths::latency_unit(op), paths::duration_unit(op)),
        VersionFamily::Cassandra3x | VersionFamily::Cassandra4x => {
            (paths::duration_unit(op), paths::latency_unit(op))
        }
    };
    FallbackChain::single("latency unit", first, decode::time_unit)
        .or(second, decode::time_unit)
        .or(paths::latency_rate_unit(op), decode::rate_unit)
}

/// `RateUnit` of the unavailables meter, as a constant or a decorated string
fn unavailables_unit_chain(op: ClientOp) -> FallbackChain<TimeUnit> {
    let path = paths::unavailables_rate_unit(op);
    FallbackChain::single("unavailables unit", path, decode::time_unit).or(path, decode::rate_unit)
}

fn memtable_flush_chain(family: VersionFamily) -> FallbackChain<f64> {
    let (first, second) = match family {
        VersionFamily::Cassandra4x => (
            paths::MEMTABLE_POST_FLUSH_POOL_PENDING,
            paths::MEMTABLE_POST_FLUSHER_PENDING,
        ),
        VersionFamily::Cassandra2x | VersionFamily::Cassandra3x => (
            paths::MEMTABLE_POST_FLUSHER_PENDING,
            paths::MEMTABLE_POST_FLUSH_POOL_PENDING,
        ),
    };
    number("memtable flush pending", first).or(second, decode::number)
}

fn load_chain() -> FallbackChain<f64> {
    number("storage load", paths::LOAD).or(paths::LOAD_STRING, decode::formatted_size)
}

/// Commit log size in bytes
///
/// Some builds publish the size as a formatted string, so the preferred path
/// is retried as text last.
fn commit_log_chain(family: VersionFamily) -> FallbackChain<f64> {
    let (chain, preferred) = match family {
        VersionFamily::Cassandra2x => (
            number("commit log size", paths::COMMITLOG_TOTAL_SIZE)
                .or(paths::COMMITLOG_ACTIVE_ON_DISK, decode::number),
            paths::COMMITLOG_TOTAL_SIZE,
        ),
        VersionFamily::Cassandra3x => (
            number("commit log size", paths::COMMITLOG_TOTAL_SIZE)
                .or(paths::COMMITLOG_ACTIVE_ON_DISK, decode::number)
                .or(paths::COMMITLOG_METRIC_SIZE, decode::number),
            paths::COMMITLOG_TOTAL_SIZE,
        ),
        VersionFamily::Cassandra4x => (
            number("commit log size", paths::COMMITLOG_METRIC_SIZE)
                .or(paths::COMMITLOG_TOTAL_SIZE, decode::number)
                .or(paths::COMMITLOG_ACTIVE_ON_DISK, decode::number),
            paths::COMMITLOG_METRIC_SIZE,
        ),
    };
    chain.or(preferred, decode::formatted_size)
}
