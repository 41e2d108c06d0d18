//! Application state for the web layer.

use std::sync::Arc;

use crate::collector::CollectionScheduler;
use crate::names::NameResolver;
use crate::planner::JourneyPlanner;
use crate::quota::ApiQuotaManager;

/// Shared application state.
///
/// Contains all the services needed to handle requests. `S` is the transit
/// data source and `W` the segment weight store.
pub struct AppState<S, W> {
    /// Journey planner over the stored weights
    pub planner: Arc<JourneyPlanner<W, NameResolver<S>>>,

    /// Background collection loop
    pub scheduler: Arc<CollectionScheduler<S, W>>,

    /// Daily transit API budget
    pub quota: Arc<ApiQuotaManager>,
}

impl<S, W> AppState<S, W> {
    /// Create a new app state.
    pub fn new(
        planner: Arc<JourneyPlanner<W, NameResolver<S>>>,
        scheduler: Arc<CollectionScheduler<S, W>>,
        quota: Arc<ApiQuotaManager>,
    ) -> Self {
        Self {
            planner,
            scheduler,
            quota,
        }
    }
}

// Derived Clone would require `S: Clone` and `W: Clone`.
impl<S, W> Clone for AppState<S, W> {
    fn clone(&self) -> Self {
        Self {
            planner: Arc::clone(&self.planner),
            scheduler: Arc::clone(&self.scheduler),
            quota: Arc::clone(&self.quota),
        }
    }
}
