//! Management endpoint access layer

pub mod attribute;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod jolokia;
pub mod management;

pub use attribute::{AttributePath, AttributeValue};
#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeCluster, FakeConnection, FakeNode};
pub use jolokia::{JolokiaConnection, JolokiaConnector};
pub use management::{
    connect_first, Connector, Credentials, HostEndpoint, ManagementConnection,
    ManagementConnectionExt,
};
