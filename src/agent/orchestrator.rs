//! Poll orchestrator
//!
//! Drives one poll cycle for a configured cluster: probe topology, derive the
//! cluster-wide failure metrics, visit every live member, filter, report.
//! A cycle either reports everything it collected or nothing at all.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::client::{connect_first, Connector, HostEndpoint};
use crate::cluster::ClusterTopology;
use crate::config::AgentConfig;
use crate::metrics::{cluster_failure_metrics, filter_reportable, select_template, Metric, Reporter};
use crate::utils::{AgentError, Result};

/// Where an agent is within its poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    ProbingTopology,
    FetchingClusterMetrics,
    FetchingPerHostMetrics { host: String },
    Reporting,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Idle => write!(f, "idle"),
            PollState::ProbingTopology => write!(f, "probing topology"),
            PollState::FetchingClusterMetrics => write!(f, "fetching cluster metrics"),
            PollState::FetchingPerHostMetrics { host } => write!(f, "fetching metrics for {}", host),
            PollState::Reporting => write!(f, "reporting"),
        }
    }
}

/// Outcome of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Metrics handed to the reporter
    pub reported: usize,
    /// Metrics dropped for a null or NaN value
    pub dropped: usize,
    pub hosts_polled: usize,
    /// Live members that could not be connected to or identified
    pub hosts_skipped: usize,
    /// The cycle hit an error before reporting and reported nothing
    pub aborted: bool,
}

impl CycleReport {
    fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }
}

/// Polls one cluster and hands its metrics to a reporter
///
/// Cycles must not overlap; callers drive `poll_cycle` from a single loop.
pub struct Agent<C: Connector, R: Reporter> {
    config: AgentConfig,
    connector: C,
    reporter: R,
    state: PollState,
}

impl<C: Connector, R: Reporter> Agent<C, R> {
    pub fn new(config: AgentConfig, connector: C, reporter: R) -> Self {
        Self {
            config,
            connector,
            reporter,
            state: PollState::Idle,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Run one full cycle
    ///
    /// Errors are logged and swallowed; an aborted cycle reports nothing.
    /// The agent is `Idle` on return.
    pub fn poll_cycle(&mut self) -> CycleReport {
        let result = self.collect_cycle();
        let report = match result {
            Ok((metrics, mut report)) => {
                let (kept, dropped) = filter_reportable(metrics);
                report.dropped = dropped;
                self.state = PollState::Reporting;
                for metric in &kept {
                    if let Some(value) = metric.reportable_value() {
                        self.reporter.report(&metric.name, metric.unit.as_str(), value);
                    }
                }
                self.reporter.flush();
                report.reported = kept.len();
                info!(
                    "{}: reported {} metrics from {} hosts ({} dropped, {} hosts skipped)",
                    self.config.name, report.reported, report.hosts_polled, report.dropped,
                    report.hosts_skipped
                );
                report
            }
            Err(e) => {
                error!(
                    "{}: poll cycle aborted while {}: {}",
                    self.config.name, self.state, e
                );
                CycleReport::aborted()
            }
        };
        self.state = PollState::Idle;
        report
    }

    /// Steps 1-3: everything up to the reporter hand-off
    fn collect_cycle(&mut self) -> Result<(Vec<Metric>, CycleReport)> {
        let mut report = CycleReport::default();

        self.state = PollState::ProbingTopology;
        let (seed, mut conn) = connect_first(
            &self.connector,
            &self.config.hosts,
            self.config.port,
            &self.config.credentials,
        )?;
        debug!("{}: seed connection to {}", self.config.name, seed);
        let topology = ClusterTopology::probe(&mut conn)?;
        if topology.is_empty() {
            return Err(AgentError::Topology(format!(
                "{} reported no cluster members",
                seed
            )));
        }
        debug!(
            "{}: {} members, {} live",
            self.config.name,
            topology.len(),
            topology.num_live()
        );

        self.state = PollState::FetchingClusterMetrics;
        let mut metrics = cluster_failure_metrics(&mut conn, &topology)?;
        drop(conn);

        for host in topology.live_hosts() {
            self.state = PollState::FetchingPerHostMetrics {
                host: host.to_string(),
            };
            match self.poll_host(host) {
                Ok(host_metrics) => {
                    report.hosts_polled += 1;
                    metrics.extend(host_metrics);
                }
                Err(e) => {
                    warn!("{}: skipping host {}: {}", self.config.name, host, e);
                    report.hosts_skipped += 1;
                }
            }
        }

        Ok((metrics, report))
    }

    /// Open a dedicated connection to `host` and collect its catalog
    ///
    /// The connection is dropped on return, on every path.
    fn poll_host(&self, host: &str) -> Result<Vec<Metric>> {
        let endpoint = HostEndpoint::new(host, self.config.port, self.config.credentials.clone());
        let mut conn = self.connector.connect(&endpoint)?;
        let template = select_template(&mut conn, host, self.config.server_version)?;
        Ok(template.collect(&mut conn))
    }
}
