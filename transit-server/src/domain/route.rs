//! Route identifiers, direction codes and route stop lists.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geo;

use super::error::DomainError;
use super::stop::StopId;

/// Identifier of a bus route or rail line as used by the transit data
/// service. This is the internal id, not the public-facing route number.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteId(Arc<str>);

impl RouteId {
    /// Parse a route identifier, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyIdentifier("route"));
        }
        Ok(RouteId(Arc::from(trimmed)))
    }

    /// Line id of the built-in light-rail line.
    pub fn light_rail() -> Self {
        RouteId(Arc::from("LRT1"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RouteId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RouteId::parse(&value)
    }
}

impl From<RouteId> for String {
    fn from(id: RouteId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({})", self.as_str())
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bus direction code: 0 (outbound) or 1 (inbound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Direction(u8);

impl Direction {
    pub const OUTBOUND: Direction = Direction(0);
    pub const INBOUND: Direction = Direction(1);

    /// Validate a raw direction code.
    pub fn new(code: i64) -> Result<Self, DomainError> {
        match code {
            0 | 1 => Ok(Direction(code as u8)),
            other => Err(DomainError::InvalidDirection(other)),
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Direction {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Direction::new(value)
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> Self {
        d.0
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stop in a route's ordered stop list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopOnRoute {
    pub stop_id: StopId,

    /// Display name, when the data service provides one.
    pub name: Option<String>,

    pub lat: f64,
    pub lng: f64,

    /// Position along the route within its direction.
    pub sequence: u32,

    pub direction: Direction,
}

impl StopOnRoute {
    /// Whether the coordinates can be used for distance estimates.
    pub fn has_coordinates(&self) -> bool {
        geo::is_known_position(self.lat, self.lng)
    }

    pub fn coords(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}
