//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::collector::CollectionMode;
use crate::domain::TravelMode;
use crate::planner::{Itinerary, PlanResult, Segment, SolveRequest};
use crate::quota::ApiQuotaManager;

/// Snap radius used when a plan request does not give one (meters).
pub const DEFAULT_SNAP_RADIUS_M: f64 = 400.0;

/// Transfer cap used when a plan request does not give one.
pub const DEFAULT_MAX_TRANSFERS: i64 = 2;

/// Query string of `GET /plan`.
#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,

    /// Maximum walk (meters) from each endpoint to a stop
    pub snap_radius_m: Option<f64>,

    /// Maximum number of transfers; negative counts as zero
    pub max_transfers: Option<i64>,
}

impl PlanQuery {
    pub fn to_request(&self) -> SolveRequest {
        SolveRequest {
            from: [self.from_lat, self.from_lng],
            to: [self.to_lat, self.to_lng],
            snap_radius_m: self.snap_radius_m.unwrap_or(DEFAULT_SNAP_RADIUS_M),
            max_transfers: self.max_transfers.unwrap_or(DEFAULT_MAX_TRANSFERS),
        }
    }
}

/// A segment of an itinerary.
#[derive(Debug, Serialize)]
pub struct SegmentResult {
    pub mode: TravelMode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,

    /// Public route number (buses only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<u8>,

    pub minutes: f64,

    /// `[lat, lng]` per stop; unknown positions are `null`
    pub points: Vec<Option<[f64; 2]>>,

    pub stop_ids: Vec<String>,
    pub stop_names: Vec<Option<String>>,
}

/// One candidate journey.
#[derive(Debug, Serialize)]
pub struct ItineraryResult {
    pub total_minutes: f64,
    pub rides: u32,
    pub used_transfers: u32,
    pub segments: Vec<SegmentResult>,
}

/// Response of `GET /plan`.
///
/// The top-level fields describe the fastest candidate; `candidates` holds
/// every ride-count bucket, fastest first.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Whether any path was found
    pub found: bool,

    pub total_minutes: Option<f64>,
    pub used_transfers: Option<u32>,
    pub segments: Vec<SegmentResult>,
    pub candidates: Vec<ItineraryResult>,

    /// Whether the search budget cut exploration short
    pub truncated: bool,
}

/// Body of `POST /collector/run`.
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    pub batch_size: Option<usize>,
    pub mode: Option<CollectionMode>,
}

/// Body of `POST /collector/toggle`.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Body of `POST /collector/interval`.
#[derive(Debug, Deserialize)]
pub struct IntervalRequest {
    pub interval_secs: u64,
}

/// Response of `GET /quota`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct QuotaResponse {
    pub used: u64,
    pub remaining: u64,
    pub limit: u64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl SegmentResult {
    pub fn from_segment(segment: &Segment) -> Self {
        Self {
            mode: segment.mode,
            route_id: segment.route.as_ref().map(|r| r.as_str().to_string()),
            route_number: segment.route_number.clone(),
            direction: segment.direction.map(|d| d.code()),
            minutes: round_minutes(segment.minutes),
            points: segment
                .points
                .iter()
                .map(|p| p.iter().all(|v| v.is_finite()).then_some(*p))
                .collect(),
            stop_ids: segment
                .stop_ids
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            stop_names: segment.stop_names.clone(),
        }
    }
}

impl ItineraryResult {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            total_minutes: round_minutes(itinerary.total_minutes),
            rides: itinerary.rides,
            used_transfers: itinerary.used_transfers,
            segments: itinerary
                .segments
                .iter()
                .map(SegmentResult::from_segment)
                .collect(),
        }
    }
}

impl PlanResponse {
    pub fn from_result(result: &PlanResult) -> Self {
        let best = result.best();
        Self {
            found: best.is_some(),
            total_minutes: best.map(|b| round_minutes(b.total_minutes)),
            used_transfers: best.map(|b| b.used_transfers),
            segments: best
                .map(|b| b.segments.iter().map(SegmentResult::from_segment).collect())
                .unwrap_or_default(),
            candidates: result
                .candidates
                .iter()
                .map(ItineraryResult::from_itinerary)
                .collect(),
            truncated: result.truncated,
        }
    }
}

impl QuotaResponse {
    pub fn from_quota(quota: &ApiQuotaManager) -> Self {
        Self {
            used: quota.used_today(),
            remaining: quota.remaining_today(),
            limit: quota.daily_limit(),
        }
    }
}

/// Round to two decimal places for display.
fn round_minutes(minutes: f64) -> f64 {
    (minutes * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, RouteId, StopId};

    fn segment() -> Segment {
        Segment {
            mode: TravelMode::Bus,
            route: Some(RouteId::parse("R1").unwrap()),
            route_number: Some("101".into()),
            direction: Some(Direction::INBOUND),
            minutes: 10.0 / 3.0,
            points: vec![[35.9, 128.6], [f64::NAN, f64::NAN]],
            stop_ids: vec![StopId::parse("A").unwrap(), StopId::end()],
            stop_names: vec![Some("Alpha".into()), None],
        }
    }

    #[test]
    fn segment_result_fields() {
        let result = SegmentResult::from_segment(&segment());

        assert_eq!(result.route_id.as_deref(), Some("R1"));
        assert_eq!(result.direction, Some(1));
        assert_eq!(result.minutes, 3.33);
        assert_eq!(result.points, vec![Some([35.9, 128.6]), None]);
        assert_eq!(result.stop_ids, vec!["A", "__END__"]);
    }

    #[test]
    fn plan_response_from_result() {
        let itinerary = Itinerary {
            total_minutes: 12.5,
            rides: 1,
            used_transfers: 0,
            segments: vec![segment()],
        };
        let result = PlanResult {
            candidates: vec![itinerary],
            truncated: false,
        };

        let response = PlanResponse::from_result(&result);
        assert!(response.found);
        assert_eq!(response.total_minutes, Some(12.5));
        assert_eq!(response.used_transfers, Some(0));
        assert_eq!(response.segments.len(), 1);
        assert_eq!(response.candidates.len(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["segments"][0]["mode"], "BUS");
        assert_eq!(json["segments"][0]["route_number"], "101");
        assert!(json["segments"][0]["points"][1].is_null());
    }

    #[test]
    fn empty_plan_response() {
        let response = PlanResponse::from_result(&PlanResult::default());
        assert!(!response.found);
        assert!(response.total_minutes.is_none());
        assert!(response.segments.is_empty());
        assert!(response.candidates.is_empty());
    }

    #[test]
    fn plan_query_defaults() {
        let query: PlanQuery =
            serde_json::from_str(r#"{"from_lat":35.9,"from_lng":128.6,"to_lat":35.8,"to_lng":128.5}"#)
                .unwrap();
        let request = query.to_request();
        assert_eq!(request.snap_radius_m, DEFAULT_SNAP_RADIUS_M);
        assert_eq!(request.max_transfers, DEFAULT_MAX_TRANSFERS);
        assert_eq!(request.from, [35.9, 128.6]);
    }

    #[test]
    fn quota_response() {
        let quota = ApiQuotaManager::new(10);
        assert!(quota.try_consume(3));
        assert_eq!(
            QuotaResponse::from_quota(&quota),
            QuotaResponse {
                used: 3,
                remaining: 7,
                limit: 10
            }
        );
    }
}
