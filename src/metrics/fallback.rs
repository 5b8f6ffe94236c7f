//! Ordered attribute fallback
//!
//! Several attributes moved or changed shape between Cassandra releases.
//! A `FallbackChain` lists the equivalent paths in preference order and
//! returns the first one that decodes. Absence is `Ok(None)`; only a
//! transport failure is an error.

use tracing::debug;

use crate::client::{AttributePath, ManagementConnection, ManagementConnectionExt};
use crate::metrics::units::{clean_units_string, parse_formatted_size, TimeUnit};
use crate::utils::FetchError;

/// Reads and converts the attribute at one candidate path
pub type Decoder<T> = fn(&mut dyn ManagementConnection, &AttributePath) -> Result<T, FetchError>;

/// Equivalent attribute paths tried in order
#[derive(Clone)]
pub struct FallbackChain<T> {
    label: &'static str,
    candidates: Vec<(AttributePath, Decoder<T>)>,
}

impl<T> FallbackChain<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            candidates: Vec::new(),
        }
    }

    /// Chain with a single candidate
    pub fn single(label: &'static str, path: AttributePath, decoder: Decoder<T>) -> Self {
        Self::new(label).or(path, decoder)
    }

    /// Append a lower-priority candidate
    pub fn or(mut self, path: AttributePath, decoder: Decoder<T>) -> Self {
        self.candidates.push((path, decoder));
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn paths(&self) -> impl Iterator<Item = &AttributePath> {
        self.candidates.iter().map(|(path, _)| path)
    }

    /// Try each candidate; stop at the first success or the first transport error
    pub fn fetch(&self, conn: &mut dyn ManagementConnection) -> Result<Option<T>, FetchError> {
        for (idx, (path, decode)) in self.candidates.iter().enumerate() {
            match decode(conn, path) {
                Ok(value) => {
                    if idx > 0 {
                        debug!("{}: using fallback {}", self.label, path);
                    }
                    return Ok(Some(value));
                }
                Err(e) if e.is_recoverable() => {
                    debug!("{}: {} unusable: {}", self.label, path, e);
                }
                Err(e) => return Err(e),
            }
        }
        debug!("{}: no candidate available", self.label);
        Ok(None)
    }
}

/// Decoders shared by every template
pub mod decode {
    use super::*;

    pub fn number(conn: &mut dyn ManagementConnection, path: &AttributePath) -> Result<f64, FetchError> {
        conn.read_f64(path)
    }

    /// Human-readable size string such as `"5 GB"`, in bytes
    pub fn formatted_size(
        conn: &mut dyn ManagementConnection,
        path: &AttributePath,
    ) -> Result<f64, FetchError> {
        let text = conn.read_text(path)?;
        Ok(parse_formatted_size(&text)?)
    }

    /// Strict `TimeUnit` constant
    pub fn time_unit(
        conn: &mut dyn ManagementConnection,
        path: &AttributePath,
    ) -> Result<TimeUnit, FetchError> {
        conn.read_time_unit(path)
    }

    /// Decorated rate unit string reduced with `clean_units_string`
    pub fn rate_unit(
        conn: &mut dyn ManagementConnection,
        path: &AttributePath,
    ) -> Result<TimeUnit, FetchError> {
        let text = conn.read_text(path)?;
        Ok(clean_units_string(&text)?)
    }

    pub fn map_keys(
        conn: &mut dyn ManagementConnection,
        path: &AttributePath,
    ) -> Result<Vec<String>, FetchError> {
        conn.read_map_keys(path)
    }

    pub fn string_list(
        conn: &mut dyn ManagementConnection,
        path: &AttributePath,
    ) -> Result<Vec<String>, FetchError> {
        conn.read_string_list(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FakeNode, AttributeValue};

    const LOAD: AttributePath = AttributePath::db("StorageService", "Load");
    const LOAD_STRING: AttributePath = AttributePath::db("StorageService", "LoadString");

    fn load_chain() -> FallbackChain<f64> {
        FallbackChain::single("load", LOAD, decode::number).or(LOAD_STRING, decode::formatted_size)
    }

    #[test]
    fn test_primary_wins() {
        let mut conn = FakeNode::new()
            .with(LOAD, AttributeValue::Float(100.0))
            .with(LOAD_STRING, "5 GB")
            .into_connection();
        assert_eq!(load_chain().fetch(&mut conn).unwrap(), Some(100.0));
    }

    #[test]
    fn test_fallback_on_missing_primary() {
        let mut conn = FakeNode::new().with(LOAD_STRING, "5 GB").into_connection();
        assert_eq!(
            load_chain().fetch(&mut conn).unwrap(),
            Some(5.0 * 1024.0 * 1024.0 * 1024.0)
        );
    }

    #[test]
    fn test_unparseable_fallback_is_absent() {
        let mut conn = FakeNode::new().with(LOAD_STRING, "lots").into_connection();
        assert_eq!(load_chain().fetch(&mut conn).unwrap(), None);
    }

    #[test]
    fn test_connection_error_stops_chain() {
        let mut conn = FakeNode::new()
            .failing(LOAD)
            .with(LOAD_STRING, "5 GB")
            .into_connection();
        assert!(load_chain().fetch(&mut conn).is_err());
    }

    #[test]
    fn test_rate_unit_fallback() {
        const UNIT: AttributePath = AttributePath::metric("ClientRequest", "Unavailables")
            .scope("Read")
            .field("RateUnit");
        let chain = FallbackChain::single("unit", UNIT, decode::time_unit).or(UNIT, decode::rate_unit);
        let mut conn = FakeNode::new().with(UNIT, "events/second").into_connection();
        assert_eq!(chain.fetch(&mut conn).unwrap(), Some(TimeUnit::Seconds));
        assert_eq!(chain.paths().count(), 2);
    }
}
