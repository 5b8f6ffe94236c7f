//! JMX over Jolokia
//!
//! Cassandra's MBeans are read through a Jolokia agent attached to each node
//! (`http://<host>:8778/jolokia/`). One `read` request is issued per
//! attribute; Jolokia reports a missing MBean or attribute as a JSON body with
//! `status: 404`, which maps onto `FetchError::AttributeNotFound`.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::attribute::{AttributePath, AttributeValue};
use super::management::{Connector, Credentials, HostEndpoint, ManagementConnection};
use crate::utils::{ConnectionError, FetchError};

/// Jolokia error types that mean "not there" rather than "broken"
const NOT_FOUND_ERRORS: &[&str] = &[
    "javax.management.AttributeNotFoundException",
    "javax.management.InstanceNotFoundException",
];

/// Body of a Jolokia `read` response
#[derive(Debug, Deserialize)]
pub struct JolokiaResponse {
    pub status: u16,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Opens `JolokiaConnection`s
#[derive(Debug, Clone)]
pub struct JolokiaConnector {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl JolokiaConnector {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }
}

impl Default for JolokiaConnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), Duration::from_secs(10))
    }
}

impl Connector for JolokiaConnector {
    type Connection = JolokiaConnection;

    /// Build a client for `endpoint` and verify the agent answers
    fn connect(&self, endpoint: &HostEndpoint) -> Result<JolokiaConnection, FetchError> {
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ConnectionError::ConnectFailed {
                host: endpoint.address.clone(),
                port: endpoint.port,
                reason: e.to_string(),
            })?;

        let conn = JolokiaConnection {
            client,
            base_url: base_url(endpoint),
            credentials: endpoint.credentials.clone(),
            endpoint: endpoint.clone(),
            request_timeout_ms: self.request_timeout.as_millis() as u64,
        };
        conn.check_version()?;
        Ok(conn)
    }
}

/// One node's Jolokia agent
pub struct JolokiaConnection {
    client: Client,
    base_url: String,
    credentials: Credentials,
    endpoint: HostEndpoint,
    request_timeout_ms: u64,
}

impl JolokiaConnection {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.credentials.is_anonymous() {
            request
        } else {
            request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
        }
    }

    fn check_version(&self) -> Result<(), ConnectionError> {
        let url = format!("{}/version", self.base_url);
        let response = self.send(self.client.get(&url))?;
        debug!("Jolokia agent at {} answered the version request", self.endpoint);
        response
            .json::<JolokiaResponse>()
            .map_err(|e| ConnectionError::InvalidResponse(e.to_string()))
            .map(|_| ())
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response, ConnectionError> {
        let response = self.authorize(request).send().map_err(|e| {
            if e.is_timeout() {
                ConnectionError::Timeout(self.request_timeout_ms)
            } else {
                ConnectionError::ConnectFailed {
                    host: self.endpoint.address.clone(),
                    port: self.endpoint.port,
                    reason: e.to_string(),
                }
            }
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ConnectionError::AuthFailed(
                format!("{} rejected credentials", self.endpoint),
            )),
            status if !status.is_success() => Err(ConnectionError::Http {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            }),
            _ => Ok(response),
        }
    }
}

impl ManagementConnection for JolokiaConnection {
    fn get_attribute(&mut self, path: &AttributePath) -> Result<AttributeValue, FetchError> {
        let url = read_url(&self.base_url, path);
        let body: JolokiaResponse = self
            .send(self.client.get(&url))?
            .json()
            .map_err(|e| ConnectionError::InvalidResponse(e.to_string()))?;
        interpret_response(path, body)
    }
}

/// `http://<host>:<port>/jolokia`, with IPv6 literals in brackets
pub fn base_url(endpoint: &HostEndpoint) -> String {
    let host = endpoint.address.as_str();
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{}]:{}/jolokia", host, endpoint.port)
    } else {
        format!("http://{}:{}/jolokia", host, endpoint.port)
    }
}

/// `<base>/read/<object>/<attribute>` with Jolokia's `!` escaping
pub fn read_url(base_url: &str, path: &AttributePath) -> String {
    format!(
        "{}/read/{}/{}",
        base_url,
        escape_segment(&path.object_name()),
        escape_segment(path.field)
    )
}

fn escape_segment(segment: &str) -> String {
    segment.replace('!', "!!").replace('/', "!/").replace('"', "!\"")
}

/// Map a Jolokia response body onto an attribute value or a fetch error
pub fn interpret_response(
    path: &AttributePath,
    response: JolokiaResponse,
) -> Result<AttributeValue, FetchError> {
    if response.status == 200 {
        return Ok(response.value.map(AttributeValue::from).unwrap_or(AttributeValue::Null));
    }

    let error_type = response.error_type.unwrap_or_default();
    if response.status == 404 || NOT_FOUND_ERRORS.contains(&error_type.as_str()) {
        return Err(FetchError::AttributeNotFound {
            object: path.object_name(),
            attribute: path.field.to_string(),
        });
    }

    Err(FetchError::Connection(ConnectionError::Http {
        status: response.status,
        body: response
            .error
            .unwrap_or_else(|| format!("{} reading {}", error_type, path)),
    }))
}
