//! In-memory management namespace
//!
//! `FakeCluster` stands in for a set of Jolokia agents: each node is a map of
//! attribute paths to values, nodes can be unreachable, and individual
//! attributes can be made to fail or time out. It records which
//! hosts were connected to and how many connections were released.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::attribute::{AttributePath, AttributeValue};
use super::management::{Connector, HostEndpoint, ManagementConnection};
use crate::metrics::templates::paths::{self, CacheKind, ClientOp};
use crate::utils::{ConnectionError, FetchError};

/// One node's attributes
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    attributes: HashMap<String, AttributeValue>,
    failing: HashSet<String>,
    timing_out: HashSet<String>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute
    pub fn with(mut self, path: AttributePath, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(path.to_string(), value.into());
        self
    }

    /// Remove an attribute so reads report it as not found
    pub fn without(mut self, path: AttributePath) -> Self {
        self.attributes.remove(&path.to_string());
        self
    }

    /// Make reads of `path` fail with a malformed response
    pub fn failing(mut self, path: AttributePath) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Make reads of `path` time out as if the node went away
    pub fn timing_out(mut self, path: AttributePath) -> Self {
        self.timing_out.insert(path.to_string());
        self
    }

    /// Publish cluster membership as a 2.x StorageService would
    pub fn with_topology(self, all: &[&str], live: &[&str]) -> Self {
        let host_ids = AttributeValue::Map(
            all.iter()
                .enumerate()
                .map(|(i, host)| (format!("/{}", host), AttributeValue::Text(format!("host-id-{}", i))))
                .collect(),
        );
        let live = AttributeValue::List(live.iter().map(|h| AttributeValue::from(*h)).collect());
        self.with(paths::HOST_ID_MAP, host_ids).with(paths::LIVE_NODES, live)
    }

    /// A healthy Cassandra 2.1 node exposing every catalog attribute
    pub fn cassandra_2x() -> Self {
        let mut node = Self::new()
            .with(paths::RELEASE_VERSION, "2.1.22")
            .with(paths::COMPACTION_PENDING, 4i64)
            .with(paths::MEMTABLE_POST_FLUSHER_PENDING, 2i64)
            .with(paths::LOAD, 1.0e9)
            .with(paths::COMMITLOG_TOTAL_SIZE, 33_554_432i64);

        for (op, mean, total) in [
            (ClientOp::Read, 1500.0, 2_000_000i64),
            (ClientOp::Write, 800.0, 1_000_000i64),
        ] {
            node = node
                .with(paths::latency_mean(op), mean)
                .with(paths::latency_unit(op), "MICROSECONDS")
                .with(paths::latency_rate_unit(op), "events/second")
                .with(paths::timeouts(op), 3i64)
                .with(paths::total_latency(op), total)
                .with(paths::unavailables_mean_rate(op), 0.5)
                .with(paths::unavailables_one_minute_rate(op), 0.25)
                .with(paths::unavailables_rate_unit(op), "events/second");
        }

        for (kind, hit_rate, size, entries, requests) in [
            (CacheKind::KeyCache, 0.9, 1_048_576i64, 1000i64, 12.5),
            (CacheKind::RowCache, 0.0, 0i64, 0i64, 0.0),
        ] {
            node = node
                .with(paths::cache_hit_rate(kind), hit_rate)
                .with(paths::cache_size(kind), size)
                .with(paths::cache_entries(kind), entries)
                .with(paths::cache_requests(kind), requests);
        }
        node
    }

    /// Connection over this node with no cluster bookkeeping
    pub fn into_connection(self) -> FakeConnection {
        FakeConnection {
            host: String::from("fake"),
            node: self,
            reads: 0,
            closed: None,
        }
    }
}

/// Scripted cluster of `FakeNode`s
#[derive(Debug, Default)]
pub struct FakeCluster {
    nodes: HashMap<String, FakeNode>,
    opened: RefCell<Vec<String>>,
    closed: Rc<Cell<usize>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reachable node
    pub fn with_node(mut self, address: &str, node: FakeNode) -> Self {
        self.nodes.insert(address.to_string(), node);
        self
    }

    /// Addresses connected to so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    /// Connections dropped so far
    pub fn closed(&self) -> usize {
        self.closed.get()
    }
}

impl Connector for FakeCluster {
    type Connection = FakeConnection;

    fn connect(&self, endpoint: &HostEndpoint) -> Result<FakeConnection, FetchError> {
        let node = self.nodes.get(&endpoint.address).ok_or_else(|| {
            ConnectionError::ConnectFailed {
                host: endpoint.address.clone(),
                port: endpoint.port,
                reason: "connection refused".to_string(),
            }
        })?;
        self.opened.borrow_mut().push(endpoint.address.clone());
        Ok(FakeConnection {
            host: endpoint.address.clone(),
            node: node.clone(),
            reads: 0,
            closed: Some(Rc::clone(&self.closed)),
        })
    }
}

/// Open connection to a `FakeNode`
#[derive(Debug)]
pub struct FakeConnection {
    host: String,
    node: FakeNode,
    reads: usize,
    closed: Option<Rc<Cell<usize>>>,
}

impl FakeConnection {
    /// Attribute reads issued so far, including failed ones
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl ManagementConnection for FakeConnection {
    fn get_attribute(&mut self, path: &AttributePath) -> Result<AttributeValue, FetchError> {
        self.reads += 1;
        let key = path.to_string();
        if self.node.timing_out.contains(&key) {
            return Err(FetchError::Connection(ConnectionError::Timeout(10_000)));
        }
        if self.node.failing.contains(&key) {
            return Err(FetchError::Connection(ConnectionError::InvalidResponse(format!(
                "{} sent a malformed body for {}",
                self.host, key
            ))));
        }
        self.node
            .attributes
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::AttributeNotFound {
                object: path.object_name(),
                attribute: path.field.to_string(),
            })
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        if let Some(ref closed) = self.closed {
            closed.set(closed.get() + 1);
        }
    }
}
