//! Stop identifiers and points.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Identifier of any point the graph can reach: a bus stop, a rail
/// station, or one of the synthetic request endpoints.
///
/// Backed by `Arc<str>` so that edges and search states can clone it
/// without allocating.
///
/// # Examples
///
/// ```
/// use transit_server::domain::StopId;
///
/// let stop = StopId::parse("BS1001").unwrap();
/// assert_eq!(stop.as_str(), "BS1001");
///
/// // Surrounding whitespace is trimmed
/// assert_eq!(StopId::parse("  BS1001 ").unwrap(), stop);
///
/// // Empty identifiers are rejected
/// assert!(StopId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopId(Arc<str>);

impl StopId {
    /// Synthetic origin of a routing request.
    pub const START: &'static str = "__START__";

    /// Synthetic destination of a routing request.
    pub const END: &'static str = "__END__";

    /// Parse a stop identifier, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyIdentifier("stop"));
        }
        Ok(StopId(Arc::from(trimmed)))
    }

    /// The synthetic start identifier.
    pub fn start() -> Self {
        StopId(Arc::from(Self::START))
    }

    /// The synthetic end identifier.
    pub fn end() -> Self {
        StopId(Arc::from(Self::END))
    }

    /// Whether this is one of the per-request synthetic endpoints.
    pub fn is_synthetic(&self) -> bool {
        &*self.0 == Self::START || &*self.0 == Self::END
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StopId::parse(&value)
    }
}

impl From<StopId> for String {
    fn from(id: StopId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.as_str())
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located point in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct StopPoint {
    pub id: StopId,
    pub lat: f64,
    pub lng: f64,
}

impl StopPoint {
    /// Create a new stop point.
    pub fn new(id: StopId, lat: f64, lng: f64) -> Self {
        Self { id, lat, lng }
    }

    /// Coordinates as a `[lat, lng]` pair.
    pub fn coords(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_empty() {
        assert_eq!(StopId::parse(" A1 ").unwrap().as_str(), "A1");
        assert_eq!(
            StopId::parse(""),
            Err(DomainError::EmptyIdentifier("stop"))
        );
    }

    #[test]
    fn synthetic_endpoints() {
        assert!(StopId::start().is_synthetic());
        assert!(StopId::end().is_synthetic());
        assert!(!StopId::parse("BS1").unwrap().is_synthetic());
    }

    #[test]
    fn serde_as_plain_string() {
        let id = StopId::parse("BS42").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"BS42\"");

        let back: StopId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<StopId>("\"  \"").is_err());
    }

    #[test]
    fn display_and_debug() {
        let id = StopId::parse("BS42").unwrap();
        assert_eq!(format!("{id}"), "BS42");
        assert_eq!(format!("{id:?}"), "StopId(BS42)");
    }
}
