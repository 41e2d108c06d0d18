//! Quota gate in front of a transit data source.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{RouteId, StopId, StopOnRoute};
use crate::quota::ApiQuotaManager;

use super::error::TransitApiError;
use super::source::TransitDataSource;
use super::types::Arrival;

/// Wraps a source so that every call first reserves one unit of the daily
/// budget, and an over-quota response closes the budget for the day.
#[derive(Debug, Clone)]
pub struct QuotaGatedSource<S> {
    inner: S,
    quota: Arc<ApiQuotaManager>,
}

impl<S: TransitDataSource> QuotaGatedSource<S> {
    pub fn new(inner: S, quota: Arc<ApiQuotaManager>) -> Self {
        Self { inner, quota }
    }

    pub fn quota(&self) -> &Arc<ApiQuotaManager> {
        &self.quota
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn reserve(&self, call: &'static str) -> Result<(), TransitApiError> {
        if self.quota.try_consume(1) {
            Ok(())
        } else {
            debug!(call, "transit API call refused by daily budget");
            Err(TransitApiError::QuotaExhausted)
        }
    }

    fn observe<T>(&self, result: Result<T, TransitApiError>) -> Result<T, TransitApiError> {
        if let Err(e) = &result
            && e.is_over_quota()
        {
            self.quota.mark_exhausted();
        }
        result
    }
}

impl<S: TransitDataSource> TransitDataSource for QuotaGatedSource<S> {
    async fn route_list(&self) -> Result<Vec<RouteId>, TransitApiError> {
        self.reserve("route_list")?;
        self.observe(self.inner.route_list().await)
    }

    async fn route_stops(&self, route: &RouteId) -> Result<Vec<StopOnRoute>, TransitApiError> {
        self.reserve("route_stops")?;
        self.observe(self.inner.route_stops(route).await)
    }

    async fn stop_arrivals(
        &self,
        stop: &StopId,
        route: &RouteId,
    ) -> Result<Vec<Arrival>, TransitApiError> {
        self.reserve("stop_arrivals")?;
        self.observe(self.inner.stop_arrivals(stop, route).await)
    }

    async fn route_number(&self, route: &RouteId) -> Result<String, TransitApiError> {
        self.reserve("route_number")?;
        self.observe(self.inner.route_number(route).await)
    }
}
