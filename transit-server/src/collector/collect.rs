//! One collection pass: pick routes, time their stop pairs, upsert weights.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::cache::RouteStopCache;
use crate::domain::{Direction, RouteId, StopId, StopOnRoute, WeightKey, WeightSample};
use crate::geo;
use crate::store::SegmentWeightStore;
use crate::transit_api::TransitDataSource;

use super::config::{CollectionMode, CollectorConfig};
use super::round_robin::RoundRobin;

/// Counters describing one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    pub mode: CollectionMode,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,

    /// Whether the route list itself could not be fetched.
    pub route_list_failed: bool,

    pub routes_selected: usize,
    pub routes_processed: usize,
    pub routes_failed: usize,

    pub pairs_upserted: usize,
    pub pairs_skipped: usize,
    pub upsert_failures: usize,

    /// Pairs timed from real-time arrival differences.
    pub arrival_estimates: usize,

    /// Pairs timed from distance, in any mode.
    pub distance_estimates: usize,

    /// Distance estimates used in refine mode because no arrival time was
    /// available.
    pub fallbacks: usize,

    /// Arrival API calls attempted.
    pub arrival_calls: usize,

    pub flush_failed: bool,
}

/// Where a pair's travel time came from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Timing {
    Arrival(f64),
    Distance(f64),
}

impl Timing {
    fn seconds(self) -> f64 {
        match self {
            Timing::Arrival(s) | Timing::Distance(s) => s,
        }
    }
}

/// Per-route memo of the soonest predicted arrival at each stop, and the
/// remaining arrival-call allowance for the route.
struct ArrivalMemo {
    soonest: HashMap<StopId, Option<u32>>,
    remaining_calls: usize,
}

impl ArrivalMemo {
    fn new(allowance: usize) -> Self {
        Self {
            soonest: HashMap::new(),
            remaining_calls: allowance,
        }
    }

    fn get(&self, stop: &StopId) -> Option<u32> {
        self.soonest.get(stop).copied().flatten()
    }
}

/// Fills segment weights from the transit data source.
pub struct SegmentWeightCollector<S, W> {
    source: Arc<S>,
    store: Arc<W>,
    stops: RouteStopCache,
    rotation: RoundRobin,
    config: CollectorConfig,
}

impl<S, W> SegmentWeightCollector<S, W>
where
    S: TransitDataSource,
    W: SegmentWeightStore,
{
    pub fn new(source: Arc<S>, store: Arc<W>, stops: RouteStopCache, config: CollectorConfig) -> Self {
        Self {
            source,
            store,
            stops,
            rotation: RoundRobin::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<W> {
        &self.store
    }

    /// Run one pass over the next `batch_size` routes of the rotation.
    ///
    /// Never fails: every problem is logged and counted in the report.
    pub async fn run_pass(&self, batch_size: usize, mode: CollectionMode) -> PassReport {
        let started = Instant::now();
        let mut report = PassReport {
            mode,
            started_at: Utc::now(),
            ..PassReport::default()
        };

        match self.source.route_list().await {
            Ok(routes) => {
                let selected = self.rotation.select(&routes, batch_size);
                report.routes_selected = selected.len();
                debug!(listed = routes.len(), selected = selected.len(), %mode, "routes selected");

                for route in &selected {
                    self.collect_route(route, mode, &mut report).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "route list fetch failed; pass skipped");
                report.route_list_failed = true;
            }
        }

        if report.pairs_upserted > 0
            && let Err(e) = self.store.flush().await
        {
            warn!(error = %e, "weight store flush failed");
            report.flush_failed = true;
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            %mode,
            routes = report.routes_selected,
            processed = report.routes_processed,
            failed = report.routes_failed,
            upserted = report.pairs_upserted,
            skipped = report.pairs_skipped,
            upsert_failures = report.upsert_failures,
            arrival_estimates = report.arrival_estimates,
            fallbacks = report.fallbacks,
            duration_ms = report.duration_ms,
            "collection pass finished"
        );
        report
    }

    async fn collect_route(&self, route: &RouteId, mode: CollectionMode, report: &mut PassReport) {
        let Some(stops) = self.stops.get_or_fetch(route, self.source.as_ref()).await else {
            warn!(route = %route, "route stops unavailable; daily budget refused the fetch");
            report.routes_failed += 1;
            return;
        };
        if stops.is_empty() {
            debug!(route = %route, "route has no stops");
            report.routes_failed += 1;
            return;
        }
        report.routes_processed += 1;

        let mut memo = ArrivalMemo::new(self.config.max_arrival_calls_per_route);

        for (direction, run) in directional_runs(&stops) {
            if mode == CollectionMode::Refine {
                self.prefetch_arrivals(route, &run, &mut memo, report).await;
            }

            for pair in run.windows(2) {
                let (from, to) = (pair[0], pair[1]);
                if from.stop_id == to.stop_id {
                    report.pairs_skipped += 1;
                    continue;
                }

                let from_arrivals = match mode {
                    CollectionMode::Refine => {
                        arrival_seconds(memo.get(&from.stop_id), memo.get(&to.stop_id))
                    }
                    CollectionMode::Seed => None,
                };
                let timing = from_arrivals
                    .map(Timing::Arrival)
                    .or_else(|| self.distance_seconds(from, to).map(Timing::Distance));

                let Some(timing) = timing else {
                    trace!(route = %route, from = %from.stop_id, to = %to.stop_id, "pair skipped");
                    report.pairs_skipped += 1;
                    continue;
                };

                match timing {
                    Timing::Arrival(_) => report.arrival_estimates += 1,
                    Timing::Distance(_) => {
                        report.distance_estimates += 1;
                        if mode == CollectionMode::Refine {
                            report.fallbacks += 1;
                        }
                    }
                }

                let sample = build_sample(route, direction, from, to, timing.seconds());
                trace!(
                    route = %route,
                    from = %from.stop_id,
                    to = %to.stop_id,
                    seconds = timing.seconds(),
                    "pair timed"
                );
                match self.store.upsert_sample(sample).await {
                    Ok(_) => report.pairs_upserted += 1,
                    Err(e) => {
                        warn!(route = %route, from = %from.stop_id, to = %to.stop_id, error = %e, "weight upsert failed");
                        report.upsert_failures += 1;
                    }
                }
            }
        }
    }

    /// Fetch arrivals for the run's stops not yet in the memo, in route
    /// order, while the route's allowance lasts.
    async fn prefetch_arrivals(
        &self,
        route: &RouteId,
        run: &[&StopOnRoute],
        memo: &mut ArrivalMemo,
        report: &mut PassReport,
    ) {
        let mut wanted: Vec<&StopId> = Vec::new();
        for stop in run {
            if wanted.len() == memo.remaining_calls {
                break;
            }
            if !memo.soonest.contains_key(&stop.stop_id) && !wanted.contains(&&stop.stop_id) {
                wanted.push(&stop.stop_id);
            }
        }
        if wanted.is_empty() {
            return;
        }

        memo.remaining_calls -= wanted.len();
        report.arrival_calls += wanted.len();

        let results = join_all(
            wanted
                .iter()
                .map(|stop| self.source.stop_arrivals(stop, route)),
        )
        .await;

        for (stop, result) in wanted.into_iter().zip(results) {
            let soonest = match result {
                Ok(arrivals) => arrivals.iter().map(|a| a.remaining_sec).min(),
                Err(e) => {
                    debug!(route = %route, stop = %stop, error = %e, "arrival lookup failed");
                    None
                }
            };
            memo.soonest.insert(stop.clone(), soonest);
        }
    }

    fn distance_seconds(&self, from: &StopOnRoute, to: &StopOnRoute) -> Option<f64> {
        if !from.has_coordinates() || !to.has_coordinates() {
            return None;
        }
        let d = geo::distance_m(from.coords(), to.coords());
        Some(self.config.estimate_seconds(d))
    }
}

/// Stops grouped by direction, each group ordered by sequence.
fn directional_runs(stops: &[StopOnRoute]) -> BTreeMap<Direction, Vec<&StopOnRoute>> {
    let mut runs: BTreeMap<Direction, Vec<&StopOnRoute>> = BTreeMap::new();
    for stop in stops {
        runs.entry(stop.direction).or_default().push(stop);
    }
    for run in runs.values_mut() {
        run.sort_by_key(|s| s.sequence);
    }
    runs
}

/// Travel time from the soonest predicted arrivals at two consecutive
/// stops; only a strictly later downstream arrival is trusted.
fn arrival_seconds(upstream: Option<u32>, downstream: Option<u32>) -> Option<f64> {
    match (upstream, downstream) {
        (Some(up), Some(down)) if down > up => Some(f64::from(down - up)),
        _ => None,
    }
}

fn build_sample(
    route: &RouteId,
    direction: Direction,
    from: &StopOnRoute,
    to: &StopOnRoute,
    travel_sec: f64,
) -> WeightSample {
    let known = from.has_coordinates() && to.has_coordinates();
    let (from_coords, to_coords, distance_m) = if known {
        (from.coords(), to.coords(), geo::distance_m(from.coords(), to.coords()))
    } else {
        // Unknown positions are stored as (0, 0), which the graph builder skips.
        ([0.0, 0.0], [0.0, 0.0], 0.0)
    };

    WeightSample {
        key: WeightKey {
            route: route.clone(),
            direction,
            from: from.stop_id.clone(),
            to: to.stop_id.clone(),
        },
        from_coords,
        to_coords,
        distance_m,
        travel_sec,
    }
}
