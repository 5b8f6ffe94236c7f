//! cassandra-metrics-agent library
//!
//! Polls Cassandra clusters over JMX (via Jolokia) and reports a uniform,
//! version-independent metric catalog per node.

pub mod agent;
pub mod client;
pub mod cluster;
pub mod config;
pub mod metrics;
pub mod utils;
