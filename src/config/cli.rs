//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::metrics::{OutputFormat, ServerVersion, VersionFamily};

/// Polls a Cassandra cluster over JMX and reports node metrics
#[derive(Parser, Debug, Clone)]
#[command(name = "cassandra-metrics-agent")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct CliArgs {
    /// Print help information
    #[arg(long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,

    // ===== Agent =====
    /// Agent display name
    #[arg(long = "name", default_value = "Cassandra")]
    pub name: String,

    /// Seed host (repeatable or comma-separated)
    #[arg(short = 'h', long = "host", default_value = "127.0.0.1", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub hosts: Vec<String>,

    /// Jolokia port on every node
    #[arg(short = 'p', long = "port", default_value_t = 8778)]
    pub port: u16,

    /// Username for the management endpoint
    #[arg(long = "user")]
    pub username: Option<String>,

    /// Password for the management endpoint
    #[arg(short = 'a', long = "password")]
    pub password: Option<String>,

    /// Plugin file with one or more agents (overrides host options)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Release family of the cluster
    #[arg(long = "server-version", value_enum, default_value_t = ServerVersionArg::Auto)]
    pub server_version: ServerVersionArg,

    // ===== Polling =====
    /// Seconds between poll cycles
    #[arg(long = "interval-secs", default_value_t = 60)]
    pub interval_secs: u64,

    /// Run a single cycle and exit
    #[arg(long = "once")]
    pub once: bool,

    /// Connection timeout in milliseconds
    #[arg(long = "connect-timeout-ms", default_value_t = 2000)]
    pub connect_timeout_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long = "request-timeout-ms", default_value_t = 10000)]
    pub request_timeout_ms: u64,

    // ===== Output =====
    /// Output format for reported metrics
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Console)]
    pub output_format: OutputFormat,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Errors only
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// `--server-version` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServerVersionArg {
    Auto,
    #[value(name = "2x")]
    V2x,
    #[value(name = "3x")]
    V3x,
    #[value(name = "4x")]
    V4x,
}

impl From<ServerVersionArg> for ServerVersion {
    fn from(arg: ServerVersionArg) -> Self {
        match arg {
            ServerVersionArg::Auto => ServerVersion::Auto,
            ServerVersionArg::V2x => ServerVersion::Pinned(VersionFamily::Cassandra2x),
            ServerVersionArg::V3x => ServerVersion::Pinned(VersionFamily::Cassandra3x),
            ServerVersionArg::V4x => ServerVersion::Pinned(VersionFamily::Cassandra4x),
        }
    }
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check option combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet are mutually exclusive".to_string());
        }
        if self.interval_secs == 0 {
            return Err("--interval-secs must be at least 1".to_string());
        }
        if self.password.is_some() && self.username.is_none() {
            return Err("--password requires --user".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("cassandra-metrics-agent").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.hosts, vec!["127.0.0.1"]);
        assert_eq!(args.port, 8778);
        assert_eq!(args.interval_secs, 60);
        assert_eq!(args.server_version, ServerVersionArg::Auto);
        assert_eq!(args.output_format, OutputFormat::Console);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_hosts_and_version() {
        let args = parse(&[
            "-h", "10.0.0.1,10.0.0.2", "-h", "10.0.0.3", "--server-version", "3x",
            "--output-format", "json",
        ]);
        assert_eq!(args.hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(
            ServerVersion::from(args.server_version),
            ServerVersion::Pinned(VersionFamily::Cassandra3x)
        );
        assert_eq!(args.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_validate() {
        assert!(parse(&["-v", "-q"]).validate().is_err());
        assert!(parse(&["--interval-secs", "0"]).validate().is_err());
        assert!(parse(&["-a", "secret"]).validate().is_err());
        assert!(parse(&["--user", "cassandra", "-a", "secret"]).validate().is_ok());
    }
}
