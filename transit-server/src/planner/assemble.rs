//! Turns a search path into rider-facing itinerary segments.

use crate::domain::{Direction, Edge, RouteId, StopId, TravelMode};
use crate::graph::TransitGraph;
use crate::names::StopNames;

use super::search::BucketPath;

/// A maximal run of edges ridden (or walked) without a change of vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub mode: TravelMode,
    pub route: Option<RouteId>,

    /// Public route number, for bus segments.
    pub route_number: Option<String>,

    pub direction: Option<Direction>,

    /// Travel time of the segment's edges, excluding transfer penalties.
    pub minutes: f64,

    /// `[lat, lng]` of every stop passed, in order.
    pub points: Vec<[f64; 2]>,
    pub stop_ids: Vec<StopId>,

    /// Parallel to `stop_ids`.
    pub stop_names: Vec<Option<String>>,
}

impl Segment {
    fn open(edge: &Edge) -> Self {
        Self {
            mode: edge.mode,
            route: edge.route.clone(),
            route_number: None,
            direction: edge.direction,
            minutes: 0.0,
            points: Vec::new(),
            stop_ids: vec![edge.from.clone()],
            stop_names: Vec::new(),
        }
    }

    /// Whether `edge` can be appended without starting a new segment.
    fn accepts(&self, edge: &Edge) -> bool {
        if self.mode != edge.mode {
            return false;
        }
        match edge.mode {
            TravelMode::Walk => true,
            TravelMode::Rail => self.route == edge.route,
            TravelMode::Bus => self.route == edge.route && self.direction == edge.direction,
        }
    }
}

/// One candidate journey.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    /// Total minutes including transfer penalties.
    pub total_minutes: f64,
    pub rides: u32,
    pub used_transfers: u32,
    pub segments: Vec<Segment>,
}

/// Split `edges` into segments, without names or coordinates.
pub fn split_segments(edges: &[Edge]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for edge in edges {
        let needs_new = segments.last().is_none_or(|s| !s.accepts(edge));
        if needs_new {
            segments.push(Segment::open(edge));
        }
        if let Some(segment) = segments.last_mut() {
            segment.minutes += edge.cost();
            segment.stop_ids.push(edge.to.clone());
        }
    }
    segments
}

/// Build the itinerary for one ride-count bucket.
///
/// Stops missing from `graph` get `NaN` coordinates; names that cannot be
/// resolved are `None`.
pub async fn assemble<N: StopNames>(
    bucket: &BucketPath,
    graph: &TransitGraph,
    names: &N,
) -> Itinerary {
    let mut segments = split_segments(&bucket.edges);

    for segment in &mut segments {
        segment.points = segment
            .stop_ids
            .iter()
            .map(|id| graph.stop(id).map_or([f64::NAN, f64::NAN], |s| s.coords()))
            .collect();

        let mut resolved = Vec::with_capacity(segment.stop_ids.len());
        for id in &segment.stop_ids {
            resolved.push(stop_name(segment, id, graph, names).await);
        }
        segment.stop_names = resolved;

        if segment.mode == TravelMode::Bus
            && let Some(route) = &segment.route
        {
            segment.route_number = Some(names.route_number(route).await);
        }
    }

    Itinerary {
        total_minutes: bucket.total_minutes,
        rides: bucket.rides,
        used_transfers: bucket.transfers(),
        segments,
    }
}

async fn stop_name<N: StopNames>(
    segment: &Segment,
    id: &StopId,
    graph: &TransitGraph,
    names: &N,
) -> Option<String> {
    if id.is_synthetic() {
        return None;
    }
    match segment.mode {
        TravelMode::Rail => names.rail_name(id),
        TravelMode::Bus => match &segment.route {
            Some(route) => names.bus_stop_name(route, id).await,
            None => None,
        },
        TravelMode::Walk if graph.is_rail_station(id) => names.rail_name(id),
        TravelMode::Walk => None,
    }
}
