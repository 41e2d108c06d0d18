//! Wire types for the transit data service.
//!
//! Every response shares an envelope carrying a result code. Codes follow
//! the public data portal convention: `"00"` is success, `"03"` means no
//! data, `"22"` means the daily request allowance is spent and `"30"`
//! means the key is not registered.

use serde::Deserialize;

use crate::domain::{Direction, RouteId, StopId, StopOnRoute};

use super::error::TransitApiError;

/// Result code for a successful call.
pub const RESULT_OK: &str = "00";

/// Result code for an empty but valid result.
pub const RESULT_NO_DATA: &str = "03";

/// Result code when the daily allowance is exceeded.
pub const RESULT_OVER_QUOTA: &str = "22";

/// Result code when the service key is not registered.
pub const RESULT_UNREGISTERED_KEY: &str = "30";

/// Response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub result_code: Option<String>,
    #[serde(default)]
    pub result_msg: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    /// Map the result code to an error, or hand back the body.
    ///
    /// A missing code is treated as success. `"03"` yields `Ok(None)`.
    pub fn into_body(self) -> Result<Option<T>, TransitApiError> {
        match self.result_code.as_deref() {
            None | Some(RESULT_OK) => Ok(Some(self.body)),
            Some(RESULT_NO_DATA) => Ok(None),
            Some(RESULT_OVER_QUOTA) => Err(TransitApiError::QuotaExceeded),
            Some(RESULT_UNREGISTERED_KEY) => Err(TransitApiError::Unauthorized),
            Some(code) => Err(TransitApiError::Api {
                status: 200,
                message: format!(
                    "result code {code}: {}",
                    self.result_msg.unwrap_or_default()
                ),
            }),
        }
    }
}

/// Body of the route list response.
#[derive(Debug, Default, Deserialize)]
pub struct RouteListBody {
    #[serde(default)]
    pub routes: Vec<RouteDto>,
}

/// A route summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDto {
    pub route_id: String,
    /// Public-facing route number (e.g. "100-1")
    #[serde(default)]
    pub route_no: Option<String>,
}

/// Body of the per-route stop list response.
#[derive(Debug, Default, Deserialize)]
pub struct RouteStopsBody {
    #[serde(default)]
    pub stops: Vec<RouteStopDto>,
}

/// A stop along a route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStopDto {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    /// Order along the route
    pub seq: u32,
    /// Direction code, 0 or 1
    #[serde(default)]
    pub direction: i64,
}

impl RouteStopDto {
    /// Convert to the domain type. Missing coordinates become `(0, 0)`,
    /// which the domain treats as unknown. Invalid ids or direction codes
    /// drop the stop.
    pub fn into_domain(self) -> Option<StopOnRoute> {
        Some(StopOnRoute {
            stop_id: StopId::parse(&self.stop_id).ok()?,
            name: self.stop_name.filter(|n| !n.trim().is_empty()),
            lat: self.lat.unwrap_or(0.0),
            lng: self.lng.unwrap_or(0.0),
            sequence: self.seq,
            direction: Direction::new(self.direction).ok()?,
        })
    }
}

/// Body of the per-stop arrival response.
#[derive(Debug, Default, Deserialize)]
pub struct ArrivalsBody {
    #[serde(default)]
    pub arrivals: Vec<ArrivalDto>,
}

/// A predicted arrival at a stop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalDto {
    pub route_id: String,
    /// Seconds until the vehicle reaches the stop
    pub remaining_sec: i64,
    #[serde(default)]
    pub remaining_stops: Option<u32>,
}

/// Body of the route detail response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetailBody {
    #[serde(default)]
    pub route_id: String,
    #[serde(default)]
    pub route_no: Option<String>,
}

/// A real-time arrival prediction for one route at one stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub route: RouteId,
    pub remaining_sec: u32,
}

impl ArrivalDto {
    /// Convert to the domain type; negative predictions are dropped.
    pub fn into_domain(self) -> Option<Arrival> {
        Some(Arrival {
            route: RouteId::parse(&self.route_id).ok()?,
            remaining_sec: u32::try_from(self.remaining_sec).ok()?,
        })
    }
}
