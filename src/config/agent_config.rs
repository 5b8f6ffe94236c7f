//! Agent configuration derived from CLI arguments or a plugin file

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::cli::CliArgs;
use crate::client::Credentials;
use crate::metrics::{OutputFormat, ServerVersion, VersionFamily};
use crate::utils::{AgentError, Result};

/// One monitored cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Display name
    pub name: String,
    /// Seed hosts, tried in order for the cluster-scoped connection
    pub hosts: Vec<String>,
    pub port: u16,
    pub credentials: Credentials,
    pub server_version: ServerVersion,
}

impl AgentConfig {
    pub fn new(name: &str, hosts: &[&str], port: u16) -> Self {
        Self {
            name: name.to_string(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            port,
            credentials: Credentials::default(),
            server_version: ServerVersion::Auto,
        }
    }

    pub fn with_server_version(mut self, version: ServerVersion) -> Self {
        self.server_version = version;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AgentError::Config("agent name is empty".to_string()));
        }
        if self.hosts.is_empty() {
            return Err(AgentError::Config(format!("agent {} has no hosts", self.name)));
        }
        if self.port == 0 {
            return Err(AgentError::Config(format!("agent {} has port 0", self.name)));
        }
        Ok(())
    }
}

/// Everything the binary needs to run
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub agents: Vec<AgentConfig>,
    pub interval: Duration,
    pub once: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub output_format: OutputFormat,
}

impl CollectorConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        args.validate().map_err(AgentError::Config)?;

        let default_version = ServerVersion::from(args.server_version);
        let agents = match args.config {
            Some(ref path) => load_plugin_file(path, default_version)?,
            None => {
                let credentials = Credentials::new(
                    args.username.as_deref().unwrap_or_default(),
                    args.password.as_deref().unwrap_or_default(),
                );
                let agent = AgentConfig {
                    name: args.name.clone(),
                    hosts: split_hosts(&args.hosts.join(",")),
                    port: args.port,
                    credentials,
                    server_version: default_version,
                };
                agent.validate()?;
                vec![agent]
            }
        };

        Ok(Self {
            agents,
            interval: Duration::from_secs(args.interval_secs),
            once: args.once,
            connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            output_format: args.output_format,
        })
    }
}

/// Plugin file layout: `{"agents": [{"name": ..., "hosts": "a,b", "port": ...}]}`
#[derive(Debug, Deserialize)]
struct PluginFile {
    agents: Vec<PluginAgent>,
}

#[derive(Debug, Deserialize)]
struct PluginAgent {
    name: String,
    hosts: String,
    port: PortValue,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    server_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

impl PortValue {
    fn resolve(&self, agent: &str) -> Result<u16> {
        match self {
            PortValue::Number(port) => Ok(*port),
            PortValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| AgentError::Config(format!("agent {} has invalid port {:?}", agent, text))),
        }
    }
}

/// Load every agent from a JSON plugin file
pub fn load_plugin_file(path: &Path, default_version: ServerVersion) -> Result<Vec<AgentConfig>> {
    let contents = fs::read_to_string(path)?;
    parse_plugin_json(&contents, default_version)
}

/// Parse plugin JSON; each agent is validated
pub fn parse_plugin_json(json: &str, default_version: ServerVersion) -> Result<Vec<AgentConfig>> {
    let file: PluginFile = serde_json::from_str(json)?;
    if file.agents.is_empty() {
        return Err(AgentError::Config("plugin file lists no agents".to_string()));
    }

    file.agents
        .into_iter()
        .map(|entry| {
            let server_version = match entry.server_version.as_deref() {
                None | Some("auto") => default_version,
                Some(family) => ServerVersion::Pinned(
                    family
                        .parse::<VersionFamily>()
                        .map_err(|e| AgentError::Config(e.to_string()))?,
                ),
            };
            let agent = AgentConfig {
                port: entry.port.resolve(&entry.name)?,
                hosts: split_hosts(&entry.hosts),
                credentials: Credentials::new(&entry.username, &entry.password),
                name: entry.name,
                server_version,
            };
            agent.validate()?;
            Ok(agent)
        })
        .collect()
}

fn split_hosts(hosts: &str) -> Vec<String> {
    hosts
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_parse_plugin_json() {
        let json = r#"{
            "agents": [
                {"name": "prod", "hosts": "10.0.0.1, 10.0.0.2", "port": "8778",
                 "username": "monitor", "password": "secret"},
                {"name": "staging", "hosts": "10.1.0.1", "port": 8779, "server_version": "4x"}
            ]
        }"#;
        let agents = parse_plugin_json(json, ServerVersion::Auto).unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].hosts, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(agents[0].port, 8778);
        assert_eq!(agents[0].credentials, Credentials::new("monitor", "secret"));
        assert_eq!(agents[0].server_version, ServerVersion::Auto);
        assert_eq!(agents[1].port, 8779);
        assert!(agents[1].credentials.is_anonymous());
        assert_eq!(
            agents[1].server_version,
            ServerVersion::Pinned(VersionFamily::Cassandra4x)
        );
    }

    #[test]
    fn test_plugin_json_rejects_bad_entries() {
        let no_hosts = r#"{"agents": [{"name": "a", "hosts": " , ", "port": 8778}]}"#;
        assert!(matches!(
            parse_plugin_json(no_hosts, ServerVersion::Auto),
            Err(AgentError::Config(_))
        ));

        let bad_port = r#"{"agents": [{"name": "a", "hosts": "h", "port": "seventy"}]}"#;
        assert!(parse_plugin_json(bad_port, ServerVersion::Auto).is_err());

        let empty = r#"{"agents": []}"#;
        assert!(parse_plugin_json(empty, ServerVersion::Auto).is_err());

        assert!(matches!(
            parse_plugin_json("not json", ServerVersion::Auto),
            Err(AgentError::Json(_))
        ));
    }

    #[test]
    fn test_load_plugin_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"agents": [{{"name": "prod", "hosts": "10.0.0.1", "port": "8778"}}]}}"#
        )
        .unwrap();
        let agents =
            load_plugin_file(file.path(), ServerVersion::Pinned(VersionFamily::Cassandra2x)).unwrap();
        assert_eq!(agents[0].name, "prod");
        assert_eq!(
            agents[0].server_version,
            ServerVersion::Pinned(VersionFamily::Cassandra2x)
        );
    }

    #[test]
    fn test_from_cli() {
        let args = CliArgs::try_parse_from([
            "cassandra-metrics-agent",
            "-h",
            "10.0.0.1,10.0.0.2",
            "--user",
            "monitor",
            "-a",
            "secret",
            "--once",
        ])
        .unwrap();
        let config = CollectorConfig::from_cli(&args).unwrap();
        assert_eq!(config.agents.len(), 1);
        assert_eq!(config.agents[0].name, "Cassandra");
        assert_eq!(config.agents[0].hosts, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(config.agents[0].credentials.username, "monitor");
        assert!(config.once);
        assert_eq!(config.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_agent_validate() {
        assert!(AgentConfig::new("prod", &["h"], 8778).validate().is_ok());
        assert!(AgentConfig::new("", &["h"], 8778).validate().is_err());
        assert!(AgentConfig::new("prod", &[], 8778).validate().is_err());
        assert!(AgentConfig::new("prod", &["h"], 0).validate().is_err());
    }
}
