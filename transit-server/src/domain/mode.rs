//! Travel modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// How an edge is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TravelMode {
    Walk,
    Bus,
    Rail,
}

impl TravelMode {
    /// Whether traversing an edge of this mode means being aboard a vehicle.
    pub fn is_vehicle(self) -> bool {
        match self {
            TravelMode::Walk => false,
            TravelMode::Bus | TravelMode::Rail => true,
        }
    }

    /// Whether the direction code distinguishes vehicle instances.
    ///
    /// Only buses run fixed one-way patterns per direction; rail edges are
    /// bidirectional along a single line.
    pub fn uses_direction(self) -> bool {
        matches!(self, TravelMode::Bus)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walk => "WALK",
            TravelMode::Bus => "BUS",
            TravelMode::Rail => "RAIL",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WALK" => Ok(TravelMode::Walk),
            "BUS" => Ok(TravelMode::Bus),
            // Light-rail feeds historically label the line as a tram.
            "RAIL" | "TRAM" => Ok(TravelMode::Rail),
            _ => Err(DomainError::UnknownMode(s.to_string())),
        }
    }
}
