//! Adjacency structure for the routing graph.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{Edge, StopId, StopPoint};

/// Directed multigraph keyed by stop identifier.
///
/// Stops are kept in a `BTreeMap` so that every pass over them (transfer
/// and snap derivation) runs in a stable order, which keeps construction
/// deterministic for identical inputs.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    stops: BTreeMap<StopId, StopPoint>,
    rail_stations: HashSet<StopId>,
    adjacency: HashMap<StopId, Vec<Edge>>,
    edge_count: usize,
}

impl TransitGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stop. The first registration of an id wins.
    pub fn add_stop(&mut self, point: StopPoint) {
        self.stops.entry(point.id.clone()).or_insert(point);
    }

    /// Register a rail station.
    pub fn add_rail_station(&mut self, point: StopPoint) {
        self.rail_stations.insert(point.id.clone());
        self.add_stop(point);
    }

    /// Add a directed edge.
    pub fn add_edge(&mut self, edge: Edge) {
        self.adjacency.entry(edge.from.clone()).or_default().push(edge);
        self.edge_count += 1;
    }

    /// Add a walking edge in both directions.
    pub fn add_walk_pair(&mut self, a: &StopId, b: &StopId, minutes: f64) {
        self.add_edge(Edge::walk(a.clone(), b.clone(), minutes));
        self.add_edge(Edge::walk(b.clone(), a.clone(), minutes));
    }

    /// Outgoing edges of `stop`, empty if it has none.
    pub fn outgoing(&self, stop: &StopId) -> &[Edge] {
        self.adjacency.get(stop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stop(&self, id: &StopId) -> Option<&StopPoint> {
        self.stops.get(id)
    }

    /// All registered stops, ordered by id.
    pub fn stops(&self) -> impl Iterator<Item = &StopPoint> {
        self.stops.values()
    }

    pub fn is_rail_station(&self, id: &StopId) -> bool {
        self.rail_stations.contains(id)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
