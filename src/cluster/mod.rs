//! Cluster membership discovery
//!
//! This module provides:
//! - Member address normalization
//! - Topology probing via the seed node's StorageService MBean

pub mod node;
pub mod topology;

pub use node::normalize_address;
pub use topology::ClusterTopology;
