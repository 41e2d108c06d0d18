//! Request-level journey planning.

use std::sync::Arc;

use tracing::debug;

use crate::domain::StopId;
use crate::graph::{GraphBuilder, RailLine, SnapQuery};
use crate::names::StopNames;
use crate::store::{SegmentWeightStore, StoreError};

use super::assemble::{Itinerary, assemble};
use super::config::PlannerConfig;
use super::search::Router;

/// A journey request between two free-form points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveRequest {
    /// `[lat, lng]` of the origin.
    pub from: [f64; 2],

    /// `[lat, lng]` of the destination.
    pub to: [f64; 2],

    /// How far (meters) the endpoints may be from a stop. Negative is 0.
    pub snap_radius_m: f64,

    /// Requested transfer cap; clamped to `[0, max_transfers_cap]`.
    pub max_transfers: i64,
}

/// Errors from planning a journey.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The request itself is malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Segment weights could not be read; no graph was built
    #[error("routing graph unavailable: {0}")]
    GraphUnavailable(#[from] StoreError),

    /// The routing task failed
    #[error("internal error: {0}")]
    Internal(String),
}

/// Candidates for one request, fastest first.
#[derive(Debug, Clone, Default)]
pub struct PlanResult {
    pub candidates: Vec<Itinerary>,

    /// Whether the search budget cut exploration short.
    pub truncated: bool,
}

impl PlanResult {
    /// The fastest candidate, if any path was found.
    pub fn best(&self) -> Option<&Itinerary> {
        self.candidates.first()
    }
}

/// Plans journeys over the current segment weights.
pub struct JourneyPlanner<W, N> {
    store: Arc<W>,
    names: Arc<N>,
    rail: Arc<RailLine>,
    config: Arc<PlannerConfig>,
}

impl<W, N> JourneyPlanner<W, N>
where
    W: SegmentWeightStore,
    N: StopNames,
{
    pub fn new(store: Arc<W>, names: Arc<N>, rail: Arc<RailLine>, config: PlannerConfig) -> Self {
        Self {
            store,
            names,
            rail,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan a journey, returning one itinerary per feasible ride count.
    ///
    /// Finding no path is a normal, empty result.
    pub async fn solve(&self, request: SolveRequest) -> Result<PlanResult, PlanError> {
        validate(&request)?;

        let weights = self.store.all().await?;

        let query = SnapQuery {
            origin: request.from,
            destination: request.to,
            snap_radius_m: request.snap_radius_m.max(0.0),
        };
        let rail = Arc::clone(&self.rail);
        let config = Arc::clone(&self.config);
        let max_transfers = request.max_transfers;

        let (graph, outcome) = tokio::task::spawn_blocking(move || {
            let graph = GraphBuilder::new(&config, &rail).build(&weights, &query);
            let outcome =
                Router::new(&graph, &config).search(&StopId::start(), &StopId::end(), max_transfers);
            (graph, outcome)
        })
        .await
        .map_err(|e| PlanError::Internal(format!("routing task failed: {e}")))?;

        debug!(
            stops = graph.stop_count(),
            edges = graph.edge_count(),
            buckets = outcome.buckets.len(),
            settled = outcome.settled,
            "journey search done"
        );

        let mut candidates = Vec::with_capacity(outcome.buckets.len());
        for bucket in &outcome.buckets {
            candidates.push(assemble(bucket, &graph, self.names.as_ref()).await);
        }
        // Stable: equal times keep the fewer-rides candidate first.
        candidates.sort_by(|a, b| a.total_minutes.total_cmp(&b.total_minutes));

        Ok(PlanResult {
            candidates,
            truncated: outcome.truncated,
        })
    }
}

fn validate(request: &SolveRequest) -> Result<(), PlanError> {
    let coords = [request.from, request.to].concat();
    if coords.iter().any(|v| !v.is_finite()) {
        return Err(PlanError::InvalidRequest(
            "coordinates must be finite numbers".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&request.from[0]) || !(-90.0..=90.0).contains(&request.to[0]) {
        return Err(PlanError::InvalidRequest(
            "latitude must be within [-90, 90]".to_string(),
        ));
    }
    if request.snap_radius_m.is_nan() {
        return Err(PlanError::InvalidRequest(
            "snap radius must be a number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Utc;

    use super::*;
    use crate::domain::{
        Direction, RouteId, SegmentWeight, TravelMode, WeightKey, WeightSample,
    };
    use crate::store::MemoryWeightStore;

    struct NoNames;

    impl StopNames for NoNames {
        fn rail_name(&self, _stop: &StopId) -> Option<String> {
            None
        }

        async fn bus_stop_name(&self, _route: &RouteId, _stop: &StopId) -> Option<String> {
            None
        }

        async fn route_number(&self, route: &RouteId) -> String {
            route.as_str().to_string()
        }
    }

    struct BrokenStore;

    impl SegmentWeightStore for BrokenStore {
        async fn upsert_sample(&self, _sample: WeightSample) -> Result<SegmentWeight, StoreError> {
            Err(StoreError::Task("read-only".into()))
        }

        async fn get(&self, _key: &WeightKey) -> Result<Option<SegmentWeight>, StoreError> {
            Ok(None)
        }

        async fn all(&self) -> Result<Vec<SegmentWeight>, StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("weights.json"),
                source: std::io::Error::other("disk on fire"),
            })
        }
    }

    const A: [f64; 2] = [35.90, 128.60];
    const B: [f64; 2] = [35.91, 128.60];
    const C: [f64; 2] = [35.92, 128.60];

    fn weight(route: &str, from: &str, a: [f64; 2], to: &str, b: [f64; 2], sec: f64) -> SegmentWeight {
        SegmentWeight::first(
            &WeightSample {
                key: WeightKey {
                    route: RouteId::parse(route).unwrap(),
                    direction: Direction::OUTBOUND,
                    from: StopId::parse(from).unwrap(),
                    to: StopId::parse(to).unwrap(),
                },
                from_coords: a,
                to_coords: b,
                distance_m: 0.0,
                travel_sec: sec,
            },
            Utc::now(),
        )
    }

    fn planner<W: SegmentWeightStore>(store: W) -> JourneyPlanner<W, NoNames> {
        let rail = RailLine::new(RouteId::parse("L").unwrap(), Vec::new());
        JourneyPlanner::new(
            Arc::new(store),
            Arc::new(NoNames),
            Arc::new(rail),
            PlannerConfig::default(),
        )
    }

    fn request(from: [f64; 2], to: [f64; 2], radius: f64, transfers: i64) -> SolveRequest {
        SolveRequest {
            from,
            to,
            snap_radius_m: radius,
            max_transfers: transfers,
        }
    }

    #[tokio::test]
    async fn through_route_without_transfers() {
        let store = MemoryWeightStore::from_rows([
            weight("R1", "A", A, "B", B, 300.0),
            weight("R1", "B", B, "C", C, 300.0),
        ]);
        let result = planner(store).solve(request(A, C, 50.0, 0)).await.unwrap();

        let best = result.best().unwrap();
        assert_eq!(result.candidates.len(), 1);
        assert!((best.total_minutes - 10.0).abs() < 1e-9);
        assert_eq!(best.used_transfers, 0);

        let modes: Vec<_> = best.segments.iter().map(|s| s.mode).collect();
        assert_eq!(modes, vec![TravelMode::Walk, TravelMode::Bus, TravelMode::Walk]);
        assert_eq!(best.segments[1].stop_ids.len(), 3);
        assert_eq!(best.segments[1].route_number.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn transfer_cap_limits_candidates() {
        let rows = [
            weight("R1", "A", A, "B", B, 300.0),
            weight("R2", "B", B, "C", C, 300.0),
        ];

        let p = planner(MemoryWeightStore::from_rows(rows.clone()));
        let one = p.solve(request(A, C, 50.0, 1)).await.unwrap();
        let best = one.best().unwrap();
        assert!((best.total_minutes - 15.0).abs() < 1e-9);
        assert_eq!(best.used_transfers, 1);

        let none = p.solve(request(A, C, 50.0, 0)).await.unwrap();
        assert!(none.candidates.is_empty());
        assert!(none.best().is_none());
    }

    #[tokio::test]
    async fn candidates_sorted_by_time() {
        // Direct R3 ride takes 30 min; the R1+R2 combination takes 15.
        let rows = [
            weight("R1", "A", A, "B", B, 300.0),
            weight("R2", "B", B, "C", C, 300.0),
            weight("R3", "A", A, "C", C, 1800.0),
        ];
        let result = planner(MemoryWeightStore::from_rows(rows))
            .solve(request(A, C, 50.0, 2))
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].rides, 2);
        assert_eq!(result.candidates[1].rides, 1);
        assert!(result.candidates[0].total_minutes <= result.candidates[1].total_minutes);
    }

    #[tokio::test]
    async fn zero_snap_radius_needs_exact_match() {
        let rows = [weight("R1", "A", A, "C", C, 300.0)];
        let p = planner(MemoryWeightStore::from_rows(rows));

        let exact = p.solve(request(A, C, 0.0, 0)).await.unwrap();
        assert_eq!(exact.candidates.len(), 1);

        let off = p
            .solve(request(A, [C[0] + 0.0001, C[1]], 0.0, 0))
            .await
            .unwrap();
        assert!(off.candidates.is_empty());

        let negative = p.solve(request(A, C, -25.0, 0)).await.unwrap();
        assert_eq!(negative.candidates.len(), 1);
    }

    #[tokio::test]
    async fn store_failure_is_graph_unavailable() {
        let err = planner(BrokenStore)
            .solve(request(A, C, 50.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::GraphUnavailable(_)));
    }

    #[tokio::test]
    async fn non_finite_coordinates_rejected() {
        let p = planner(MemoryWeightStore::new());
        let err = p
            .solve(request([f64::NAN, 128.6], C, 50.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidRequest(_)));

        let err = p
            .solve(request(A, [95.0, 128.6], 50.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn empty_store_finds_nothing() {
        let result = planner(MemoryWeightStore::new())
            .solve(request(A, C, 500.0, 3))
            .await
            .unwrap();
        assert!(result.candidates.is_empty());
        assert!(!result.truncated);
    }
}
