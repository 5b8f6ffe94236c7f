//! Management endpoint traits
//!
//! `ManagementConnection` is the one primitive the collector needs from a
//! node: read a named attribute under a named object. Typed reads are layered
//! on top through `ManagementConnectionExt`, which every connection gets for
//! free.
//!
//! Implementations:
//! - `JolokiaConnection`: JMX over Jolokia's HTTP bridge
//! - `FakeConnection`: in-memory namespace for tests

use std::fmt;

use tracing::debug;

use super::attribute::{AttributePath, AttributeValue};
use crate::metrics::units::TimeUnit;
use crate::utils::{ConnectionError, FetchError};

/// Username/password pair for the management endpoint
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// An empty username means the endpoint is unauthenticated
    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// One host to open a management connection against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEndpoint {
    pub address: String,
    pub port: u16,
    pub credentials: Credentials,
}

impl HostEndpoint {
    pub fn new(address: &str, port: u16, credentials: Credentials) -> Self {
        Self {
            address: address.to_string(),
            port,
            credentials,
        }
    }
}

impl fmt::Display for HostEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Attribute reads against one node
pub trait ManagementConnection {
    /// Read the attribute named by `path`
    ///
    /// Fails with `AttributeNotFound` when the object or attribute does not
    /// exist, and with `Connection` when the transport is unusable.
    fn get_attribute(&mut self, path: &AttributePath) -> Result<AttributeValue, FetchError>;
}

impl<T: ManagementConnection + ?Sized> ManagementConnection for &mut T {
    fn get_attribute(&mut self, path: &AttributePath) -> Result<AttributeValue, FetchError> {
        (**self).get_attribute(path)
    }
}

impl<T: ManagementConnection + ?Sized> ManagementConnection for Box<T> {
    fn get_attribute(&mut self, path: &AttributePath) -> Result<AttributeValue, FetchError> {
        (**self).get_attribute(path)
    }
}

/// Typed reads built on `get_attribute`
pub trait ManagementConnectionExt: ManagementConnection {
    /// Numeric attribute
    fn read_f64(&mut self, path: &AttributePath) -> Result<f64, FetchError> {
        let value = self.get_attribute(path)?;
        value
            .as_f64()
            .ok_or_else(|| unexpected_shape(path, "number", &value))
    }

    /// String attribute
    fn read_text(&mut self, path: &AttributePath) -> Result<String, FetchError> {
        match self.get_attribute(path)? {
            AttributeValue::Text(s) => Ok(s),
            other => Err(unexpected_shape(path, "string", &other)),
        }
    }

    /// Attribute holding a `TimeUnit` constant name such as `MICROSECONDS`
    ///
    /// A decorated rate string (`events/second`) is an unexpected shape
    /// here; callers fall back to `clean_units_string`.
    fn read_time_unit(&mut self, path: &AttributePath) -> Result<TimeUnit, FetchError> {
        let value = self.get_attribute(path)?;
        value
            .as_str()
            .and_then(|s| s.parse::<TimeUnit>().ok())
            .ok_or_else(|| unexpected_shape(path, "time unit", &value))
    }

    /// List-of-strings attribute
    fn read_string_list(&mut self, path: &AttributePath) -> Result<Vec<String>, FetchError> {
        let value = self.get_attribute(path)?;
        value
            .as_string_list()
            .ok_or_else(|| unexpected_shape(path, "list", &value))
    }

    /// Keys of a map-valued attribute
    fn read_map_keys(&mut self, path: &AttributePath) -> Result<Vec<String>, FetchError> {
        let value = self.get_attribute(path)?;
        value
            .map_keys()
            .ok_or_else(|| unexpected_shape(path, "map", &value))
    }
}

// Blanket implementation: any ManagementConnection automatically gets ManagementConnectionExt
impl<T: ManagementConnection + ?Sized> ManagementConnectionExt for T {}

fn unexpected_shape(path: &AttributePath, expected: &str, actual: &AttributeValue) -> FetchError {
    FetchError::UnexpectedShape {
        object: path.object_name(),
        attribute: path.field.to_string(),
        expected: expected.to_string(),
        actual: actual.shape().to_string(),
    }
}

/// Opens management connections
pub trait Connector {
    type Connection: ManagementConnection;

    fn connect(&self, endpoint: &HostEndpoint) -> Result<Self::Connection, FetchError>;
}

/// Open a connection to the first reachable host in `hosts`
///
/// Hosts are tried in order; the last connection error is returned when none
/// of them answers.
pub fn connect_first<C: Connector>(
    connector: &C,
    hosts: &[String],
    port: u16,
    credentials: &Credentials,
) -> Result<(HostEndpoint, C::Connection), FetchError> {
    let mut last_error = None;
    for host in hosts {
        let endpoint = HostEndpoint::new(host, port, credentials.clone());
        match connector.connect(&endpoint) {
            Ok(conn) => return Ok((endpoint, conn)),
            Err(e) => {
                debug!("Seed {} unavailable: {}", endpoint, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        FetchError::Connection(ConnectionError::ConnectFailed {
            host: String::new(),
            port,
            reason: "no hosts configured".to_string(),
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::attribute::METRICS_DOMAIN;
    use std::collections::HashMap;

    struct MockConnection {
        values: HashMap<String, AttributeValue>,
    }

    impl MockConnection {
        fn new(entries: &[(AttributePath, AttributeValue)]) -> Self {
            Self {
                values: entries
                    .iter()
                    .map(|(p, v)| (p.to_string(), v.clone()))
                    .collect(),
            }
        }
    }

    impl ManagementConnection for MockConnection {
        fn get_attribute(&mut self, path: &AttributePath) -> Result<AttributeValue, FetchError> {
            self.values
                .get(&path.to_string())
                .cloned()
                .ok_or_else(|| FetchError::AttributeNotFound {
                    object: path.object_name(),
                    attribute: path.field.to_string(),
                })
        }
    }

    const UNIT: AttributePath = AttributePath::new(METRICS_DOMAIN, "ClientRequest")
        .name("Latency")
        .scope("Read")
        .field("LatencyUnit");

    #[test]
    fn test_read_time_unit() {
        let mut conn = MockConnection::new(&[(UNIT, AttributeValue::from("MICROSECONDS"))]);
        assert_eq!(conn.read_time_unit(&UNIT).unwrap(), TimeUnit::Microseconds);
    }

    #[test]
    fn test_read_time_unit_rejects_rate_string() {
        let mut conn = MockConnection::new(&[(UNIT, AttributeValue::from("events/second"))]);
        let err = conn.read_time_unit(&UNIT).unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape { .. }));
    }

    #[test]
    fn test_read_f64_shape_mismatch() {
        let mut conn = MockConnection::new(&[(UNIT, AttributeValue::List(vec![]))]);
        let err = conn.read_f64(&UNIT).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("expected number, got list"));
    }

    #[test]
    fn test_missing_attribute() {
        let mut conn = MockConnection::new(&[]);
        assert!(matches!(
            conn.read_f64(&UNIT),
            Err(FetchError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("cassandra", "secret");
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("secret"));
        assert!(Credentials::default().is_anonymous());
    }
}
