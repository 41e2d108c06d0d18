//! Caching layer for transit API responses.
//!
//! Route stop lists and public route numbers change rarely, and every call
//! to the data service spends daily budget. Both caches live for the whole
//! process and are shared by the collector and the itinerary assembler.
//!
//! Failures are cached too (as an empty stop list or the raw route id), so a
//! broken route costs one call per process lifetime. Calls refused by the
//! local budget are not cached: nothing was learned about the route.

use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::domain::{RouteId, StopOnRoute};
use crate::transit_api::TransitDataSource;

/// Cached stop list entry.
pub type StopList = Arc<Vec<StopOnRoute>>;

/// Cache of ordered stop lists per route.
#[derive(Clone)]
pub struct RouteStopCache {
    stops: MokaCache<RouteId, StopList>,
}

impl RouteStopCache {
    pub fn new() -> Self {
        Self {
            stops: MokaCache::builder().build(),
        }
    }

    /// Get the stop list for `route`, fetching it on first use.
    ///
    /// Returns `None` only when the local budget refused the fetch. Any
    /// other failure is logged and cached as an empty list.
    pub async fn get_or_fetch<S>(&self, route: &RouteId, source: &S) -> Option<StopList>
    where
        S: TransitDataSource,
    {
        let result = self
            .stops
            .try_get_with(route.clone(), async {
                match source.route_stops(route).await {
                    Ok(stops) => {
                        debug!(route = %route, stops = stops.len(), "route stops fetched");
                        Ok(Arc::new(stops))
                    }
                    Err(e) if e.is_refused_locally() => Err(e),
                    Err(e) => {
                        warn!(route = %route, error = %e, "route stop fetch failed; caching empty list");
                        Ok(Arc::new(Vec::new()))
                    }
                }
            })
            .await;

        match result {
            Ok(stops) => Some(stops),
            Err(e) => {
                debug!(route = %route, error = %e, "route stop fetch skipped");
                None
            }
        }
    }

    /// Cached entry without fetching.
    pub async fn get(&self, route: &RouteId) -> Option<StopList> {
        self.stops.get(route).await
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.stops.entry_count()
    }
}

impl Default for RouteStopCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache of public route numbers.
#[derive(Clone)]
pub struct RouteNumberCache {
    numbers: MokaCache<RouteId, Arc<str>>,
}

impl RouteNumberCache {
    pub fn new() -> Self {
        Self {
            numbers: MokaCache::builder().build(),
        }
    }

    /// Public number of `route`, falling back to the raw id.
    pub async fn resolve<S>(&self, route: &RouteId, source: &S) -> String
    where
        S: TransitDataSource,
    {
        let result = self
            .numbers
            .try_get_with(route.clone(), async {
                match source.route_number(route).await {
                    Ok(number) => Ok(Arc::<str>::from(number)),
                    Err(e) if e.is_refused_locally() => Err(e),
                    Err(e) => {
                        debug!(route = %route, error = %e, "route number lookup failed; using id");
                        Ok(Arc::<str>::from(route.as_str()))
                    }
                }
            })
            .await;

        match result {
            Ok(number) => number.to_string(),
            Err(_) => route.as_str().to_string(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.numbers.entry_count()
    }
}

impl Default for RouteNumberCache {
    fn default() -> Self {
        Self::new()
    }
}
