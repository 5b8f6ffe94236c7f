//! Attribute addressing and raw attribute values
//!
//! An [`AttributePath`] names one readable attribute in the JMX namespace:
//! the object name is assembled from a domain plus `type`, `path`, `scope`
//! and `name` keys, and `field` is the attribute read off that object.

use std::fmt;

/// Domain holding the dropwizard metric MBeans
pub const METRICS_DOMAIN: &str = "org.apache.cassandra.metrics";
/// Domain holding StorageService, Commitlog and friends
pub const DB_DOMAIN: &str = "org.apache.cassandra.db";
/// Domain of the pre-3.0 internal thread pool MBeans
pub const INTERNAL_DOMAIN: &str = "org.apache.cassandra.internal";

/// Fully-qualified identifier of one queryable attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub domain: &'static str,
    /// `name=` key of the object
    pub key: Option<&'static str>,
    /// `type=` key of the object
    pub kind: &'static str,
    /// `scope=` key of the object
    pub scope: Option<&'static str>,
    /// `path=` key (thread pool MBeans only)
    pub group: Option<&'static str>,
    /// Attribute read from the object
    pub field: &'static str,
}

impl AttributePath {
    /// Create a path with only a domain and type; add keys with the builder methods
    pub const fn new(domain: &'static str, kind: &'static str) -> Self {
        Self {
            domain,
            key: None,
            kind,
            scope: None,
            group: None,
            field: "Value",
        }
    }

    /// `org.apache.cassandra.metrics:type=<kind>,name=<key>`
    pub const fn metric(kind: &'static str, key: &'static str) -> Self {
        Self::new(METRICS_DOMAIN, kind).name(key)
    }

    /// `org.apache.cassandra.db:type=<kind>` reading `field`
    pub const fn db(kind: &'static str, field: &'static str) -> Self {
        Self::new(DB_DOMAIN, kind).field(field)
    }

    pub const fn name(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    pub const fn scope(mut self, scope: &'static str) -> Self {
        self.scope = Some(scope);
        self
    }

    pub const fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    pub const fn field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    /// JMX object name, keys in `type, path, scope, name` order
    pub fn object_name(&self) -> String {
        let mut object = format!("{}:type={}", self.domain, self.kind);
        if let Some(group) = self.group {
            object.push_str(",path=");
            object.push_str(group);
        }
        if let Some(scope) = self.scope {
            object.push_str(",scope=");
            object.push_str(scope);
        }
        if let Some(key) = self.key {
            object.push_str(",name=");
            object.push_str(key);
        }
        object
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_name(), self.field)
    }
}

/// Raw value returned by a management endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<AttributeValue>),
    Map(Vec<(String, AttributeValue)>),
}

impl AttributeValue {
    /// Numeric view; numeric text such as `"12"` or `"NaN"` is accepted
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Flatten a list of scalars into strings
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            AttributeValue::List(items) => items.iter().map(scalar_to_string).collect(),
            _ => None,
        }
    }

    /// Keys of a map-shaped value
    pub fn map_keys(&self) -> Option<Vec<String>> {
        match self {
            AttributeValue::Map(entries) => Some(entries.iter().map(|(k, _)| k.clone()).collect()),
            _ => None,
        }
    }

    /// Short name of the runtime shape, used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Float(_) => "float",
            AttributeValue::Text(_) => "string",
            AttributeValue::List(_) => "list",
            AttributeValue::Map(_) => "map",
        }
    }
}

fn scalar_to_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Text(s) => Some(s.clone()),
        AttributeValue::Integer(i) => Some(i.to_string()),
        AttributeValue::Float(f) => Some(f.to_string()),
        AttributeValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => AttributeValue::Text(s),
            serde_json::Value::Array(items) => {
                AttributeValue::List(items.into_iter().map(AttributeValue::from).collect())
            }
            serde_json::Value::Object(map) => AttributeValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, AttributeValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_metric() {
        let path = AttributePath::metric("ClientRequest", "Latency")
            .scope("Read")
            .field("Mean");
        assert_eq!(
            path.object_name(),
            "org.apache.cassandra.metrics:type=ClientRequest,scope=Read,name=Latency"
        );
        assert_eq!(path.field, "Mean");
    }

    #[test]
    fn test_object_name_db() {
        let path = AttributePath::db("StorageService", "Load");
        assert_eq!(path.object_name(), "org.apache.cassandra.db:type=StorageService");
        assert_eq!(path.to_string(), "org.apache.cassandra.db:type=StorageService/Load");
    }

    #[test]
    fn test_object_name_thread_pool() {
        let path = AttributePath::metric("ThreadPools", "PendingTasks")
            .group("internal")
            .scope("MemtablePostFlush");
        assert_eq!(
            path.object_name(),
            "org.apache.cassandra.metrics:type=ThreadPools,path=internal,scope=MemtablePostFlush,name=PendingTasks"
        );
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(AttributeValue::Integer(42).as_f64(), Some(42.0));
        assert_eq!(AttributeValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert!(AttributeValue::from("NaN").as_f64().unwrap().is_nan());
        assert_eq!(AttributeValue::from("events/second").as_f64(), None);
        assert_eq!(AttributeValue::Null.as_f64(), None);
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "/10.0.0.1": "a1b2",
            "/10.0.0.2": "c3d4"
        });
        let value = AttributeValue::from(json);
        let mut keys = value.map_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/10.0.0.1", "/10.0.0.2"]);

        let list = AttributeValue::from(serde_json::json!(["10.0.0.1", "10.0.0.2"]));
        assert_eq!(list.as_string_list().unwrap().len(), 2);
        assert_eq!(AttributeValue::from(serde_json::json!(1.5)), AttributeValue::Float(1.5));
    }
}
