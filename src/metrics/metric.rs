//! Metric values and the naming contract with the metrics backend

use std::fmt;

use serde::Serialize;

/// Root of every metric name
pub const NAMESPACE: &str = "Cassandra";

/// Unit tag attached to each reported value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Millis,
    Rate,
    Bytes,
    Count,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Millis => "millis",
            Unit::Rate => "rate",
            Unit::Bytes => "bytes",
            Unit::Count => "count",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named measurement produced during a poll cycle
///
/// `value` is `None` when the attribute could not be read; such metrics are
/// dropped before reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub unit: Unit,
    pub value: Option<f64>,
}

impl Metric {
    pub fn new(name: impl Into<String>, unit: Unit, value: Option<f64>) -> Self {
        Self {
            name: name.into(),
            unit,
            value,
        }
    }

    /// `Cassandra/hosts/<host>/<measurement>`
    pub fn for_host(host: &str, measurement: &str, unit: Unit, value: Option<f64>) -> Self {
        Self::new(host_metric_name(host, measurement), unit, value)
    }

    /// `Cassandra/global/<measurement>`
    pub fn global(measurement: &str, unit: Unit, value: Option<f64>) -> Self {
        Self::new(global_metric_name(measurement), unit, value)
    }

    /// Value to hand to the reporter, if any
    pub fn reportable_value(&self) -> Option<f64> {
        self.value.filter(|v| !v.is_nan())
    }

    pub fn is_reportable(&self) -> bool {
        self.reportable_value().is_some()
    }
}

pub fn host_metric_name(host: &str, measurement: &str) -> String {
    format!("{}/hosts/{}/{}", NAMESPACE, host, measurement)
}

pub fn global_metric_name(measurement: &str) -> String {
    format!("{}/global/{}", NAMESPACE, measurement)
}

/// Drop metrics with no value or a NaN value; returns survivors and the drop count
pub fn filter_reportable(metrics: Vec<Metric>) -> (Vec<Metric>, usize) {
    let total = metrics.len();
    let kept: Vec<Metric> = metrics.into_iter().filter(Metric::is_reportable).collect();
    let dropped = total - kept.len();
    (kept, dropped)
}
