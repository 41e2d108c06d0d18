//! Persisted segment weights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo;

use super::route::{Direction, RouteId};
use super::stop::StopId;

/// Primary key of a segment weight row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeightKey {
    pub route: RouteId,
    pub direction: Direction,
    pub from: StopId,
    pub to: StopId,
}

/// One timing observation for a stop pair, with the denormalized stop
/// coordinates the graph builder needs.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSample {
    pub key: WeightKey,
    pub from_coords: [f64; 2],
    pub to_coords: [f64; 2],
    pub distance_m: f64,
    pub travel_sec: f64,
}

/// Running-average travel time between two consecutive stops of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentWeight {
    pub key: WeightKey,
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
    pub distance_m: f64,

    /// Incremental mean of every sample seen for this key.
    pub travel_sec_avg: f64,

    /// Number of samples folded into the average. Never decreases.
    pub sample_count: u64,

    pub updated_at: DateTime<Utc>,
}

impl SegmentWeight {
    /// Create a row from its first sample.
    pub fn first(sample: &WeightSample, now: DateTime<Utc>) -> Self {
        Self {
            key: sample.key.clone(),
            from_lat: sample.from_coords[0],
            from_lng: sample.from_coords[1],
            to_lat: sample.to_coords[0],
            to_lng: sample.to_coords[1],
            distance_m: sample.distance_m,
            travel_sec_avg: sample.travel_sec,
            sample_count: 1,
            updated_at: now,
        }
    }

    /// Fold another sample into the running average.
    ///
    /// Coordinates and distance are refreshed from the sample, since stop
    /// positions occasionally get corrected upstream.
    pub fn absorb(&mut self, sample: &WeightSample, now: DateTime<Utc>) {
        let n = self.sample_count as f64;
        self.travel_sec_avg += (sample.travel_sec - self.travel_sec_avg) / (n + 1.0);
        self.sample_count += 1;
        self.from_lat = sample.from_coords[0];
        self.from_lng = sample.from_coords[1];
        self.to_lat = sample.to_coords[0];
        self.to_lng = sample.to_coords[1];
        self.distance_m = sample.distance_m;
        self.updated_at = now;
    }

    /// Edge weight in minutes, floored at 0.1 so that no bus hop is free.
    pub fn minutes(&self) -> f64 {
        (self.travel_sec_avg / 60.0).max(0.1)
    }

    /// Whether both stops carry usable coordinates.
    pub fn has_coordinates(&self) -> bool {
        geo::is_known_position(self.from_lat, self.from_lng)
            && geo::is_known_position(self.to_lat, self.to_lng)
    }
}
