//! JMX attribute paths read by the templates and the topology probe

use crate::client::attribute::{AttributePath, INTERNAL_DOMAIN};

/// Client request kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOp {
    Read,
    Write,
}

impl ClientOp {
    pub const ALL: [ClientOp; 2] = [ClientOp::Read, ClientOp::Write];

    /// `scope=` key of the ClientRequest MBeans
    pub const fn scope(self) -> &'static str {
        match self {
            ClientOp::Read => "Read",
            ClientOp::Write => "Write",
        }
    }

    /// Trailing segment of the metric name
    pub const fn label(self) -> &'static str {
        match self {
            ClientOp::Read => "Reads",
            ClientOp::Write => "Writes",
        }
    }
}

/// Cache kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    KeyCache,
    RowCache,
}

impl CacheKind {
    pub const ALL: [CacheKind; 2] = [CacheKind::KeyCache, CacheKind::RowCache];

    pub const fn scope(self) -> &'static str {
        match self {
            CacheKind::KeyCache => "KeyCache",
            CacheKind::RowCache => "RowCache",
        }
    }
}

pub const fn client_request(op: ClientOp, key: &'static str, field: &'static str) -> AttributePath {
    AttributePath::metric("ClientRequest", key)
        .scope(op.scope())
        .field(field)
}

pub const fn cache(kind: CacheKind, key: &'static str, field: &'static str) -> AttributePath {
    AttributePath::metric("Cache", key).scope(kind.scope()).field(field)
}

// Latency group
pub const fn latency_mean(op: ClientOp) -> AttributePath {
    client_request(op, "Latency", "Mean")
}
pub const fn latency_unit(op: ClientOp) -> AttributePath {
    client_request(op, "Latency", "LatencyUnit")
}
pub const fn duration_unit(op: ClientOp) -> AttributePath {
    client_request(op, "Latency", "DurationUnit")
}
pub const fn latency_rate_unit(op: ClientOp) -> AttributePath {
    client_request(op, "Latency", "RateUnit")
}
pub const fn timeouts(op: ClientOp) -> AttributePath {
    client_request(op, "Timeouts", "Count")
}
pub const fn total_latency(op: ClientOp) -> AttributePath {
    client_request(op, "TotalLatency", "Count")
}
pub const fn unavailables_mean_rate(op: ClientOp) -> AttributePath {
    client_request(op, "Unavailables", "MeanRate")
}
pub const fn unavailables_one_minute_rate(op: ClientOp) -> AttributePath {
    client_request(op, "Unavailables", "OneMinuteRate")
}
pub const fn unavailables_rate_unit(op: ClientOp) -> AttributePath {
    client_request(op, "Unavailables", "RateUnit")
}

// System group
pub const COMPACTION_PENDING: AttributePath = AttributePath::metric("Compaction", "PendingTasks");
pub const MEMTABLE_POST_FLUSHER_PENDING: AttributePath =
    AttributePath::new(INTERNAL_DOMAIN, "MemtablePostFlusher").field("PendingTasks");
pub const MEMTABLE_POST_FLUSH_POOL_PENDING: AttributePath =
    AttributePath::metric("ThreadPools", "PendingTasks")
        .group("internal")
        .scope("MemtablePostFlush");

// Storage group
pub const LOAD: AttributePath = AttributePath::db("StorageService", "Load");
pub const LOAD_STRING: AttributePath = AttributePath::db("StorageService", "LoadString");
pub const COMMITLOG_TOTAL_SIZE: AttributePath = AttributePath::db("Commitlog", "TotalCommitlogSize");
pub const COMMITLOG_ACTIVE_ON_DISK: AttributePath = AttributePath::db("Commitlog", "ActiveOnDiskSize");
pub const COMMITLOG_METRIC_SIZE: AttributePath = AttributePath::metric("CommitLog", "TotalCommitLogSize");

// Cache group
pub const fn cache_hit_rate(kind: CacheKind) -> AttributePath {
    cache(kind, "HitRate", "Value")
}
pub const fn cache_size(kind: CacheKind) -> AttributePath {
    cache(kind, "Size", "Value")
}
pub const fn cache_entries(kind: CacheKind) -> AttributePath {
    cache(kind, "Entries", "Value")
}
pub const fn cache_requests(kind: CacheKind) -> AttributePath {
    cache(kind, "Requests", "OneMinuteRate")
}

// Topology and version detection
pub const RELEASE_VERSION: AttributePath = AttributePath::db("StorageService", "ReleaseVersion");
pub const HOST_ID_MAP: AttributePath = AttributePath::db("StorageService", "HostIdMap");
pub const ENDPOINT_TO_HOST_ID: AttributePath = AttributePath::db("StorageService", "EndpointToHostId");
pub const LIVE_NODES: AttributePath = AttributePath::db("StorageService", "LiveNodes");
pub const UNREACHABLE_NODES: AttributePath = AttributePath::db("StorageService", "UnreachableNodes");
