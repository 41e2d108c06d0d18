//! Stop and route name lookup for itineraries.
//!
//! Every lookup is best-effort: a missing name is `None` (or the raw route
//! id for route numbers) rather than an error.

use std::future::Future;
use std::sync::Arc;

use crate::cache::{RouteNumberCache, RouteStopCache};
use crate::domain::{RouteId, StopId};
use crate::graph::RailLine;
use crate::transit_api::TransitDataSource;

/// Name lookups needed to present an itinerary.
pub trait StopNames: Send + Sync {
    /// Display name of a rail station.
    fn rail_name(&self, stop: &StopId) -> Option<String>;

    /// Display name of a stop on a bus route.
    fn bus_stop_name(
        &self,
        route: &RouteId,
        stop: &StopId,
    ) -> impl Future<Output = Option<String>> + Send;

    /// Public route number, or the raw route id when unknown.
    fn route_number(&self, route: &RouteId) -> impl Future<Output = String> + Send;
}

/// Resolves names from the static rail table and the shared route caches.
pub struct NameResolver<S> {
    rail: Arc<RailLine>,
    stops: RouteStopCache,
    numbers: RouteNumberCache,
    source: Arc<S>,
}

impl<S: TransitDataSource> NameResolver<S> {
    pub fn new(
        rail: Arc<RailLine>,
        stops: RouteStopCache,
        numbers: RouteNumberCache,
        source: Arc<S>,
    ) -> Self {
        Self {
            rail,
            stops,
            numbers,
            source,
        }
    }
}

impl<S: TransitDataSource> StopNames for NameResolver<S> {
    fn rail_name(&self, stop: &StopId) -> Option<String> {
        self.rail.name_of(stop).map(str::to_string)
    }

    async fn bus_stop_name(&self, route: &RouteId, stop: &StopId) -> Option<String> {
        let stops = self.stops.get_or_fetch(route, self.source.as_ref()).await?;
        stops
            .iter()
            .find(|s| &s.stop_id == stop)
            .and_then(|s| s.name.clone())
    }

    async fn route_number(&self, route: &RouteId) -> String {
        self.numbers.resolve(route, self.source.as_ref()).await
    }
}
