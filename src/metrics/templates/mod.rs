//! Version-specific metric catalogs
//!
//! A template declares which attributes to read from one host and how to
//! turn them into named, unit-tagged metrics. Cassandra 2.x is the reference
//! catalog; later families reuse its groups and only reorder the attribute
//! fallback chains where MBeans moved.

pub mod catalog;
pub mod paths;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

pub use catalog::CatalogTemplate;

use crate::client::{ManagementConnection, ManagementConnectionExt};
use crate::metrics::metric::Metric;
use crate::utils::{FetchError, ParseError};

/// Cassandra release family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionFamily {
    Cassandra2x,
    Cassandra3x,
    Cassandra4x,
}

impl VersionFamily {
    /// Map a `ReleaseVersion` string such as `"3.11.4"` to its family
    ///
    /// 5.x and later read like 4.x.
    pub fn from_release(release: &str) -> Result<Self, ParseError> {
        let major: u32 = release
            .trim()
            .split(|c: char| c == '.' || c == '-')
            .next()
            .and_then(|m| m.parse().ok())
            .ok_or_else(|| ParseError::Version(release.to_string()))?;

        match major {
            2 => Ok(VersionFamily::Cassandra2x),
            3 => Ok(VersionFamily::Cassandra3x),
            m if m >= 4 => Ok(VersionFamily::Cassandra4x),
            _ => Err(ParseError::Version(release.to_string())),
        }
    }

    /// Read `ReleaseVersion` from the node
    ///
    /// Falls back to 2.x when the version cannot be read or parsed; a
    /// transport error is returned as is.
    pub fn detect(conn: &mut dyn ManagementConnection) -> Result<Self, FetchError> {
        let release = match conn.read_text(&paths::RELEASE_VERSION) {
            Ok(release) => release,
            Err(e) if e.is_recoverable() => {
                debug!("Release version unavailable ({}), assuming 2.x", e);
                return Ok(VersionFamily::Cassandra2x);
            }
            Err(e) => return Err(e),
        };

        Ok(Self::from_release(&release).unwrap_or_else(|e| {
            debug!("{}, assuming 2.x", e);
            VersionFamily::Cassandra2x
        }))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionFamily::Cassandra2x => "2x",
            VersionFamily::Cassandra3x => "3x",
            VersionFamily::Cassandra4x => "4x",
        }
    }
}

impl fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionFamily {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2x" | "2" => Ok(VersionFamily::Cassandra2x),
            "3x" | "3" => Ok(VersionFamily::Cassandra3x),
            "4x" | "4" => Ok(VersionFamily::Cassandra4x),
            _ => Err(ParseError::Version(s.to_string())),
        }
    }
}

/// How the family of each host is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerVersion {
    /// Read `ReleaseVersion` from every host
    #[default]
    Auto,
    Pinned(VersionFamily),
}

/// Metric catalog for one host
pub trait MetricTemplate {
    fn family(&self) -> VersionFamily;

    /// Address used in per-host metric names
    fn host(&self) -> &str;

    /// Every metric derivable from this host
    ///
    /// Never fails: each derivation group is isolated and a failing group
    /// only loses its own metrics. Once the host stops answering, the
    /// remaining groups are not attempted.
    fn collect(&self, conn: &mut dyn ManagementConnection) -> Vec<Metric>;
}

/// Pick the template for `host`
pub fn select_template(
    conn: &mut dyn ManagementConnection,
    host: &str,
    version: ServerVersion,
) -> Result<Box<dyn MetricTemplate>, FetchError> {
    let family = match version {
        ServerVersion::Pinned(family) => family,
        ServerVersion::Auto => VersionFamily::detect(conn)?,
    };
    debug!("Using {} catalog for {}", family, host);
    Ok(Box::new(CatalogTemplate::new(family, host)))
}
