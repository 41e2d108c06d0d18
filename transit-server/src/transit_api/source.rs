//! Abstraction over the transit data service.

use std::future::Future;

use crate::domain::{RouteId, StopId, StopOnRoute};

use super::error::TransitApiError;
use super::types::Arrival;

/// Trait for querying transit data.
///
/// This abstraction lets the collector and the name lookups run against
/// the live HTTP client, the quota gate, or in-memory test data.
pub trait TransitDataSource: Send + Sync {
    /// All route ids known to the service.
    fn route_list(&self) -> impl Future<Output = Result<Vec<RouteId>, TransitApiError>> + Send;

    /// Ordered stops of a route, across both directions.
    fn route_stops(
        &self,
        route: &RouteId,
    ) -> impl Future<Output = Result<Vec<StopOnRoute>, TransitApiError>> + Send;

    /// Real-time arrival predictions for `route` at `stop`.
    fn stop_arrivals(
        &self,
        stop: &StopId,
        route: &RouteId,
    ) -> impl Future<Output = Result<Vec<Arrival>, TransitApiError>> + Send;

    /// Public-facing route number.
    fn route_number(
        &self,
        route: &RouteId,
    ) -> impl Future<Output = Result<String, TransitApiError>> + Send;
}
