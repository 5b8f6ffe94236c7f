//! Metric extraction, normalization and reporting
//!
//! This module provides:
//! - The `Metric` model and the `Cassandra/...` naming contract
//! - Time-unit and formatted-size normalization
//! - Ordered attribute fallback chains
//! - Version-specific metric catalogs
//! - Cluster-wide failure metrics
//! - Reporter sinks

pub mod failures;
pub mod fallback;
pub mod metric;
pub mod reporter;
pub mod templates;
pub mod units;

pub use failures::cluster_failure_metrics;
pub use fallback::FallbackChain;
pub use metric::{filter_reportable, Metric, Unit, NAMESPACE};
pub use reporter::{ConsoleReporter, OutputFormat, RecordingReporter, Reporter};
pub use templates::{select_template, CatalogTemplate, MetricTemplate, ServerVersion, VersionFamily};
pub use units::{clean_units_string, parse_formatted_size, to_millis, TimeUnit};
