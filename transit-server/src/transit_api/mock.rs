//! In-memory transit data source for testing without API access.
//!
//! Serves fixed route, stop and arrival data, either built up in code or
//! loaded from a JSON fixture, and counts how often each method is called.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Deserialize;

use crate::domain::{RouteId, StopId, StopOnRoute};

use super::error::TransitApiError;
use super::source::TransitDataSource;
use super::types::Arrival;

/// Snapshot of the per-method call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub route_list: usize,
    pub route_stops: usize,
    pub stop_arrivals: usize,
    pub route_number: usize,
}

#[derive(Debug, Default)]
struct Counters {
    route_list: AtomicUsize,
    route_stops: AtomicUsize,
    stop_arrivals: AtomicUsize,
    route_number: AtomicUsize,
}

/// Mock transit source.
///
/// Clones share counters, so a test can keep a handle after moving a clone
/// into the component under test.
#[derive(Debug, Clone, Default)]
pub struct MockTransitSource {
    routes: Vec<RouteId>,
    stops: HashMap<RouteId, Vec<StopOnRoute>>,
    arrivals: HashMap<(StopId, RouteId), Vec<u32>>,
    numbers: HashMap<RouteId, String>,
    failing: HashSet<RouteId>,
    over_quota: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

/// JSON fixture layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    routes: Vec<FixtureRoute>,
    #[serde(default)]
    arrivals: Vec<FixtureArrival>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureRoute {
    id: RouteId,
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    stops: Vec<StopOnRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureArrival {
    stop: StopId,
    route: RouteId,
    remaining_sec: Vec<u32>,
}

impl MockTransitSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file.
    ///
    /// ```json
    /// { "routes": [ { "id": "R1", "number": "101", "stops": [ ... ] } ],
    ///   "arrivals": [ { "stop": "S1", "route": "R1", "remainingSec": [60] } ] }
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TransitApiError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TransitApiError::Api {
            status: 0,
            message: format!("Failed to read mock fixture {}: {e}", path.display()),
        })?;
        Self::from_json(&json)
    }

    /// Parse fixture JSON.
    pub fn from_json(json: &str) -> Result<Self, TransitApiError> {
        let fixture: Fixture = serde_json::from_str(json).map_err(|e| TransitApiError::Json {
            message: e.to_string(),
            body: None,
        })?;

        let mut mock = Self::new();
        for route in fixture.routes {
            if let Some(number) = route.number {
                mock = mock.with_route_number(route.id.clone(), number);
            }
            mock = mock.with_route(route.id, route.stops);
        }
        for arrival in fixture.arrivals {
            mock = mock.with_arrivals(arrival.stop, arrival.route, arrival.remaining_sec);
        }
        Ok(mock)
    }

    /// Add a route and its stop list.
    pub fn with_route(mut self, route: RouteId, stops: Vec<StopOnRoute>) -> Self {
        if !self.routes.contains(&route) {
            self.routes.push(route.clone());
        }
        self.stops.insert(route, stops);
        self
    }

    /// Predicted arrival times for `route` at `stop`.
    pub fn with_arrivals(mut self, stop: StopId, route: RouteId, remaining_sec: Vec<u32>) -> Self {
        self.arrivals.insert((stop, route), remaining_sec);
        self
    }

    pub fn with_route_number(mut self, route: RouteId, number: impl Into<String>) -> Self {
        self.numbers.insert(route, number.into());
        self
    }

    /// Make every call about `route` fail with a server error.
    pub fn failing_route(mut self, route: RouteId) -> Self {
        self.failing.insert(route);
        self
    }

    /// Make every call fail with the service's over-quota response.
    pub fn reporting_over_quota(self) -> Self {
        self.over_quota.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            route_list: self.counters.route_list.load(Ordering::SeqCst),
            route_stops: self.counters.route_stops.load(Ordering::SeqCst),
            stop_arrivals: self.counters.stop_arrivals.load(Ordering::SeqCst),
            route_number: self.counters.route_number.load(Ordering::SeqCst),
        }
    }

    fn check(&self, route: Option<&RouteId>) -> Result<(), TransitApiError> {
        if self.over_quota.load(Ordering::SeqCst) {
            return Err(TransitApiError::QuotaExceeded);
        }
        match route {
            Some(route) if self.failing.contains(route) => Err(TransitApiError::Api {
                status: 500,
                message: format!("mock failure for route {route}"),
            }),
            _ => Ok(()),
        }
    }
}

impl TransitDataSource for MockTransitSource {
    async fn route_list(&self) -> Result<Vec<RouteId>, TransitApiError> {
        self.counters.route_list.fetch_add(1, Ordering::SeqCst);
        self.check(None)?;
        Ok(self.routes.clone())
    }

    async fn route_stops(&self, route: &RouteId) -> Result<Vec<StopOnRoute>, TransitApiError> {
        self.counters.route_stops.fetch_add(1, Ordering::SeqCst);
        self.check(Some(route))?;
        self.stops
            .get(route)
            .cloned()
            .ok_or_else(|| TransitApiError::NotFound(format!("route {route}")))
    }

    async fn stop_arrivals(
        &self,
        stop: &StopId,
        route: &RouteId,
    ) -> Result<Vec<Arrival>, TransitApiError> {
        self.counters.stop_arrivals.fetch_add(1, Ordering::SeqCst);
        self.check(Some(route))?;
        Ok(self
            .arrivals
            .get(&(stop.clone(), route.clone()))
            .map(|secs| {
                secs.iter()
                    .map(|&remaining_sec| Arrival {
                        route: route.clone(),
                        remaining_sec,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn route_number(&self, route: &RouteId) -> Result<String, TransitApiError> {
        self.counters.route_number.fetch_add(1, Ordering::SeqCst);
        self.check(Some(route))?;
        self.numbers
            .get(route)
            .cloned()
            .ok_or_else(|| TransitApiError::NotFound(format!("route number for {route}")))
    }
}
