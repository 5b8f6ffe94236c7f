//! cassandra-metrics-agent - periodic Cassandra metrics collector
//!
//! Runs every configured agent once per interval and writes the reported
//! metrics to stdout. Logs go to stderr.

use std::io::Stdout;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use cassandra_metrics_agent::agent::Agent;
use cassandra_metrics_agent::client::JolokiaConnector;
use cassandra_metrics_agent::config::{CliArgs, CollectorConfig};
use cassandra_metrics_agent::metrics::ConsoleReporter;

type StdoutAgent = Agent<JolokiaConnector, ConsoleReporter<Stdout>>;

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn print_banner(config: &CollectorConfig) {
    info!("cassandra-metrics-agent v{}", env!("CARGO_PKG_VERSION"));
    for agent in &config.agents {
        info!(
            "Agent {}: hosts={} port={} version={:?}",
            agent.name,
            agent.hosts.join(","),
            agent.port,
            agent.server_version
        );
    }
    if config.once {
        info!("Running a single poll cycle");
    } else {
        info!("Polling every {}s", config.interval.as_secs());
    }
}

fn build_agents(config: &CollectorConfig) -> Vec<StdoutAgent> {
    config
        .agents
        .iter()
        .map(|agent| {
            let connector = JolokiaConnector::new(config.connect_timeout, config.request_timeout);
            let reporter = ConsoleReporter::stdout(config.output_format);
            Agent::new(agent.clone(), connector, reporter)
        })
        .collect()
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    setup_logging(args.verbose, args.quiet)?;

    let config = CollectorConfig::from_cli(&args).context("Invalid configuration")?;
    print_banner(&config);

    let mut agents = build_agents(&config);

    // Cycles run back to back on this thread and never overlap
    loop {
        let started = Instant::now();
        for agent in agents.iter_mut() {
            let report = agent.poll_cycle();
            debug!("{}: cycle finished {:?}", agent.name(), report);
        }

        if config.once {
            return Ok(());
        }

        if let Some(remaining) = config.interval.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
