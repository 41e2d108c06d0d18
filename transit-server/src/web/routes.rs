//! HTTP route handlers.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::collector::{PassReport, SchedulerStatus};
use crate::planner::PlanError;
use crate::store::SegmentWeightStore;
use crate::transit_api::TransitDataSource;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S, W>(state: AppState<S, W>) -> Router
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/plan", get(plan::<S, W>))
        .route("/collector/run", post(run_collector::<S, W>))
        .route("/collector/toggle", post(toggle_collector::<S, W>))
        .route("/collector/interval", post(set_interval::<S, W>))
        .route("/collector/status", get(collector_status::<S, W>))
        .route("/quota", get(quota::<S, W>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan a journey between two points.
async fn plan<S, W>(
    State(state): State<AppState<S, W>>,
    Query(query): Query<PlanQuery>,
) -> Result<Json<PlanResponse>, AppError>
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    let result = state.planner.solve(query.to_request()).await?;
    Ok(Json(PlanResponse::from_result(&result)))
}

/// Run one collection pass now.
async fn run_collector<S, W>(
    State(state): State<AppState<S, W>>,
    body: Option<Json<RunRequest>>,
) -> Result<Json<PassReport>, AppError>
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    let Json(req) = body.unwrap_or_default();
    state
        .scheduler
        .run_once(req.batch_size, req.mode)
        .await
        .map(Json)
        .ok_or_else(|| AppError::Conflict {
            message: "a collection pass is already running".to_string(),
        })
}

/// Enable or disable the background loop.
async fn toggle_collector<S, W>(
    State(state): State<AppState<S, W>>,
    Json(req): Json<ToggleRequest>,
) -> Json<SchedulerStatus>
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    state.scheduler.set_enabled(req.enabled);
    Json(state.scheduler.status())
}

/// Change the sleep between background passes.
async fn set_interval<S, W>(
    State(state): State<AppState<S, W>>,
    Json(req): Json<IntervalRequest>,
) -> Result<Json<SchedulerStatus>, AppError>
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    if req.interval_secs == 0 {
        return Err(AppError::BadRequest {
            message: "interval_secs must be at least 1".to_string(),
        });
    }
    state
        .scheduler
        .set_interval(Duration::from_secs(req.interval_secs));
    Ok(Json(state.scheduler.status()))
}

async fn collector_status<S, W>(State(state): State<AppState<S, W>>) -> Json<SchedulerStatus>
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    Json(state.scheduler.status())
}

async fn quota<S, W>(State(state): State<AppState<S, W>>) -> Json<QuotaResponse>
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    Json(QuotaResponse::from_quota(&state.quota))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Conflict { message: String },
    Unavailable { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::InvalidRequest(message) => AppError::BadRequest { message },
            PlanError::GraphUnavailable(_) => AppError::Unavailable {
                message: e.to_string(),
            },
            PlanError::Internal(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest { message }
            | AppError::Conflict { message }
            | AppError::Unavailable { message }
            | AppError::Internal { message } => message,
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::{RouteNumberCache, RouteStopCache};
    use crate::collector::{
        CollectionMode, CollectionScheduler, CollectorConfig, SchedulerConfig,
        SegmentWeightCollector,
    };
    use crate::domain::{Direction, RouteId, StopId, StopOnRoute};
    use crate::graph::RailLine;
    use crate::names::NameResolver;
    use crate::planner::{JourneyPlanner, PlannerConfig};
    use crate::quota::ApiQuotaManager;
    use crate::store::{MemoryWeightStore, StoreError};
    use crate::transit_api::{MockTransitSource, QuotaGatedSource};

    type Source = QuotaGatedSource<MockTransitSource>;

    fn stops() -> Vec<StopOnRoute> {
        [("A", 35.90), ("B", 35.91), ("C", 35.92)]
            .iter()
            .zip(1..)
            .map(|(&(id, lat), seq)| StopOnRoute {
                stop_id: StopId::parse(id).unwrap(),
                name: Some(format!("Stop {id}")),
                lat,
                lng: 128.6,
                sequence: seq,
                direction: Direction::OUTBOUND,
            })
            .collect()
    }

    fn state(limit: u64) -> AppState<Source, MemoryWeightStore> {
        let r1 = RouteId::parse("R1").unwrap();
        let mock = MockTransitSource::new()
            .with_route(r1.clone(), stops())
            .with_route_number(r1, "101");
        let quota = Arc::new(ApiQuotaManager::new(limit));
        let source = Arc::new(QuotaGatedSource::new(mock, quota.clone()));
        let store = Arc::new(MemoryWeightStore::new());
        let stop_cache = RouteStopCache::new();
        let rail = Arc::new(RailLine::new(RouteId::parse("L").unwrap(), Vec::new()));

        let names = NameResolver::new(
            rail.clone(),
            stop_cache.clone(),
            RouteNumberCache::new(),
            source.clone(),
        );
        let planner = JourneyPlanner::new(
            store.clone(),
            Arc::new(names),
            rail,
            PlannerConfig::default(),
        );
        let collector = SegmentWeightCollector::new(source, store, stop_cache, CollectorConfig::default());
        let scheduler = CollectionScheduler::new(Arc::new(collector), SchedulerConfig::default());

        AppState::new(Arc::new(planner), Arc::new(scheduler), quota)
    }

    fn plan_query(radius: Option<f64>) -> PlanQuery {
        PlanQuery {
            from_lat: 35.90,
            from_lng: 128.6,
            to_lat: 35.92,
            to_lng: 128.6,
            snap_radius_m: radius,
            max_transfers: Some(0),
        }
    }

    #[tokio::test]
    async fn plan_after_manual_collection() {
        let state = state(100);

        let empty = plan(State(state.clone()), Query(plan_query(None)))
            .await
            .unwrap();
        assert!(!empty.found);

        let report = run_collector(
            State(state.clone()),
            Some(Json(RunRequest {
                batch_size: Some(1),
                mode: Some(CollectionMode::Seed),
            })),
        )
        .await
        .unwrap();
        assert_eq!(report.pairs_upserted, 2);

        let found = plan(State(state.clone()), Query(plan_query(None)))
            .await
            .unwrap();
        assert!(found.found);
        assert_eq!(found.used_transfers, Some(0));

        let ride = found
            .segments
            .iter()
            .find(|s| s.route_id.is_some())
            .unwrap();
        assert_eq!(ride.route_number.as_deref(), Some("101"));
        assert_eq!(ride.stop_names[0].as_deref(), Some("Stop A"));
    }

    #[tokio::test]
    async fn invalid_plan_is_bad_request() {
        let state = state(100);
        let mut query = plan_query(None);
        query.from_lat = f64::INFINITY;

        let err = plan(State(state), Query(query)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn collector_controls() {
        let state = state(100);

        let status = toggle_collector(State(state.clone()), Json(ToggleRequest { enabled: true })).await;
        assert!(status.enabled);

        let status = set_interval(State(state.clone()), Json(IntervalRequest { interval_secs: 30 }))
            .await
            .unwrap();
        assert_eq!(status.interval_secs, 30);

        let err = set_interval(State(state.clone()), Json(IntervalRequest { interval_secs: 0 }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let status = collector_status(State(state)).await;
        assert!(status.last_report.is_none());
    }

    #[tokio::test]
    async fn quota_reports_usage() {
        let state = state(50);
        run_collector(State(state.clone()), None).await.unwrap();

        let Json(q) = quota(State(state)).await;
        assert_eq!(q.limit, 50);
        // One route list call and one stop list call.
        assert_eq!(q.used, 2);
        assert_eq!(q.remaining, 48);
    }

    #[test]
    fn error_status_mapping() {
        let err: AppError = PlanError::InvalidRequest("bad".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = PlanError::GraphUnavailable(StoreError::Task("down".into())).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: AppError = PlanError::Internal("panic".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::Conflict {
            message: "busy".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
