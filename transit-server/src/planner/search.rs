//! Ride-constrained shortest-path search.
//!
//! Runs Dijkstra over an augmented state space where each node is a
//! (stop, vehicle aboard, ride count) combination. Reaching the destination
//! does not end the search: the goal is the fastest path for *every* ride
//! count up to the cap, so exploration continues until the queue drains.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, trace, warn};

use crate::domain::{Direction, Edge, RouteId, StopId, TravelMode};
use crate::graph::TransitGraph;

use super::config::PlannerConfig;

/// A node of the search space.
///
/// Two states are the same node iff every field matches. Walking states
/// carry no route or direction; rail states carry no direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub stop: StopId,

    /// Mode of the edge that led here; `None` only for the start state.
    pub mode: Option<TravelMode>,

    pub route: Option<RouteId>,
    pub direction: Option<Direction>,

    /// Boardings taken on the path so far.
    pub rides: u32,
}

impl StateKey {
    /// The initial state at `stop`, before any boarding.
    pub fn start(stop: StopId) -> Self {
        Self {
            stop,
            mode: None,
            route: None,
            direction: None,
            rides: 0,
        }
    }

    /// Whether `edge` continues the vehicle this state is aboard.
    fn continues(&self, edge: &Edge) -> bool {
        edge.mode.is_vehicle()
            && self.mode == Some(edge.mode)
            && self.route == edge.route
            && (!edge.mode.uses_direction() || self.direction == edge.direction)
    }

    /// Follow `edge`, returning the next state and the step cost in minutes.
    ///
    /// Boarding a vehicle other than the current one is a new ride; every
    /// new ride after the first pays `transfer_penalty`.
    pub fn step(&self, edge: &Edge, transfer_penalty: f64) -> (StateKey, f64) {
        let new_ride = edge.mode.is_vehicle() && !self.continues(edge);

        let mut cost = edge.cost();
        let mut rides = self.rides;
        if new_ride {
            if rides > 0 {
                cost += transfer_penalty;
            }
            rides += 1;
        }

        let (route, direction) = match edge.mode {
            TravelMode::Walk => (None, None),
            TravelMode::Rail => (edge.route.clone(), None),
            TravelMode::Bus => (edge.route.clone(), edge.direction),
        };

        let next = StateKey {
            stop: edge.to.clone(),
            mode: Some(edge.mode),
            route,
            direction,
            rides,
        };
        (next, cost)
    }
}

/// Priority queue entry, ordered so that `BinaryHeap` pops the smallest
/// distance first.
#[derive(Debug)]
struct QueueEntry {
    dist: f64,
    key: StateKey,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist.total_cmp(&other.dist) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.dist.total_cmp(&self.dist)
    }
}

/// Fastest path found for one ride count.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPath {
    /// Number of boardings; transfers are `rides - 1`.
    pub rides: u32,

    /// Total minutes including transfer penalties.
    pub total_minutes: f64,

    /// Edges from start to end.
    pub edges: Vec<Edge>,
}

impl BucketPath {
    pub fn transfers(&self) -> u32 {
        self.rides.saturating_sub(1)
    }
}

/// Result of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// One entry per ride count that reached the end, ordered by ride count.
    pub buckets: Vec<BucketPath>,

    /// Ride cap the search ran with.
    pub max_rides: u32,

    /// Number of states popped and expanded.
    pub settled: usize,

    /// Whether the settled-state budget cut the search short. Buckets that
    /// were found are still optimal; larger ones may be missing.
    pub truncated: bool,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket(&self, rides: u32) -> Option<&BucketPath> {
        self.buckets.iter().find(|b| b.rides == rides)
    }
}

/// Replay `edges` from a fresh start state and sum the step costs.
///
/// For any bucket returned by [`Router::search`] this equals its
/// `total_minutes` up to floating-point error.
pub fn replay_minutes(edges: &[Edge], transfer_penalty: f64) -> f64 {
    let Some(first) = edges.first() else {
        return 0.0;
    };
    let mut state = StateKey::start(first.from.clone());
    let mut total = 0.0;
    for edge in edges {
        let (next, cost) = state.step(edge, transfer_penalty);
        total += cost;
        state = next;
    }
    total
}

/// Ride-constrained router over one request's graph.
pub struct Router<'g> {
    graph: &'g TransitGraph,
    config: &'g PlannerConfig,
}

impl<'g> Router<'g> {
    pub fn new(graph: &'g TransitGraph, config: &'g PlannerConfig) -> Self {
        Self { graph, config }
    }

    /// Find the fastest path from `start` to `end` for each ride count in
    /// `1..=max_transfers + 1`.
    ///
    /// An unreachable end yields an empty outcome, not an error.
    pub fn search(&self, start: &StopId, end: &StopId, max_transfers: i64) -> SearchOutcome {
        let max_rides = self.config.max_rides(max_transfers);
        let penalty = self.config.transfer_penalty_mins;

        let start_key = StateKey::start(start.clone());

        let mut best: HashMap<StateKey, f64> = HashMap::new();
        let mut prev: HashMap<StateKey, (StateKey, &'g Edge)> = HashMap::new();
        // Index r holds the best arrival using exactly r rides.
        let mut arrivals: Vec<Option<(f64, StateKey)>> = vec![None; max_rides as usize + 1];

        let mut queue = BinaryHeap::new();
        best.insert(start_key.clone(), 0.0);
        queue.push(QueueEntry {
            dist: 0.0,
            key: start_key.clone(),
        });

        let mut settled = 0usize;
        let mut truncated = false;

        while let Some(QueueEntry { dist, key }) = queue.pop() {
            if best.get(&key).is_some_and(|&d| dist > d) {
                continue;
            }

            settled += 1;
            if settled > self.config.max_settled_states {
                truncated = true;
                break;
            }

            if &key.stop == end && (1..=max_rides).contains(&key.rides) {
                let slot = &mut arrivals[key.rides as usize];
                if slot.as_ref().is_none_or(|(d, _)| dist < *d) {
                    trace!(rides = key.rides, minutes = dist, "arrival recorded");
                    *slot = Some((dist, key.clone()));
                }
            }

            for edge in self.graph.outgoing(&key.stop) {
                let (next, cost) = key.step(edge, penalty);
                if next.rides > max_rides {
                    continue;
                }

                let candidate = dist + cost;
                if best.get(&next).is_none_or(|&d| candidate < d) {
                    best.insert(next.clone(), candidate);
                    prev.insert(next.clone(), (key.clone(), edge));
                    queue.push(QueueEntry {
                        dist: candidate,
                        key: next,
                    });
                }
            }
        }

        if truncated {
            warn!(
                settled,
                budget = self.config.max_settled_states,
                "search budget exhausted; larger ride counts may be missing"
            );
        }

        let buckets: Vec<BucketPath> = arrivals
            .into_iter()
            .enumerate()
            .filter_map(|(rides, arrival)| {
                let (total, key) = arrival?;
                let edges = reconstruct(&prev, &start_key, &key)?;
                Some(BucketPath {
                    rides: rides as u32,
                    total_minutes: total,
                    edges,
                })
            })
            .collect();

        debug!(
            settled,
            states = best.len(),
            buckets = buckets.len(),
            max_rides,
            "search finished"
        );

        SearchOutcome {
            buckets,
            max_rides,
            settled,
            truncated,
        }
    }
}

/// Walk predecessor links from `end` back to `start`.
///
/// Returns `None` if the chain breaks before reaching the start.
fn reconstruct(
    prev: &HashMap<StateKey, (StateKey, &Edge)>,
    start: &StateKey,
    end: &StateKey,
) -> Option<Vec<Edge>> {
    let mut edges = Vec::new();
    let mut current = end;

    while current != start {
        let (before, edge) = prev.get(current)?;
        edges.push((*edge).clone());
        current = before;

        // A chain can never be longer than the number of recorded links.
        if edges.len() > prev.len() {
            return None;
        }
    }

    edges.reverse();
    Some(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    fn route(s: &str) -> RouteId {
        RouteId::parse(s).unwrap()
    }

    #[test]
    fn walk_is_never_a_ride() {
        let start = StateKey::start(id("A"));
        let (next, cost) = start.step(&Edge::walk(id("A"), id("B"), 3.0), 5.0);

        assert_eq!(next.rides, 0);
        assert_eq!(next.mode, Some(TravelMode::Walk));
        assert!(next.route.is_none());
        assert_eq!(cost, 3.0);
    }

    #[test]
    fn first_boarding_has_no_penalty() {
        let start = StateKey::start(id("A"));
        let edge = Edge::bus(route("R1"), Direction::OUTBOUND, id("A"), id("B"), 4.0);
        let (next, cost) = start.step(&edge, 5.0);

        assert_eq!(next.rides, 1);
        assert_eq!(cost, 4.0);
    }

    #[test]
    fn same_bus_continues_ride() {
        let start = StateKey::start(id("A"));
        let e1 = Edge::bus(route("R1"), Direction::OUTBOUND, id("A"), id("B"), 4.0);
        let e2 = Edge::bus(route("R1"), Direction::OUTBOUND, id("B"), id("C"), 4.0);

        let (s1, _) = start.step(&e1, 5.0);
        let (s2, cost) = s1.step(&e2, 5.0);

        assert_eq!(s2.rides, 1);
        assert_eq!(cost, 4.0);
    }

    #[test]
    fn opposite_bus_direction_is_a_transfer() {
        let start = StateKey::start(id("A"));
        let e1 = Edge::bus(route("R1"), Direction::OUTBOUND, id("A"), id("B"), 4.0);
        let e2 = Edge::bus(route("R1"), Direction::INBOUND, id("B"), id("C"), 4.0);

        let (s1, _) = start.step(&e1, 5.0);
        let (s2, cost) = s1.step(&e2, 5.0);

        assert_eq!(s2.rides, 2);
        assert_eq!(cost, 9.0);
    }

    #[test]
    fn rail_ignores_direction() {
        let start = StateKey::start(id("A"));
        let e1 = Edge::rail(route("L"), id("A"), id("B"), 2.0);
        let e2 = Edge::rail(route("L"), id("B"), id("A"), 2.0);

        let (s1, _) = start.step(&e1, 5.0);
        let (s2, _) = s1.step(&e2, 5.0);

        assert_eq!(s2.rides, 1);
        assert!(s2.direction.is_none());
    }

    #[test]
    fn walking_between_same_route_reboards() {
        let start = StateKey::start(id("A"));
        let e1 = Edge::bus(route("R1"), Direction::OUTBOUND, id("A"), id("B"), 4.0);
        let walk = Edge::walk(id("B"), id("B2"), 1.0);
        let e2 = Edge::bus(route("R1"), Direction::OUTBOUND, id("B2"), id("C"), 4.0);

        let (s1, _) = start.step(&e1, 5.0);
        let (s2, _) = s1.step(&walk, 5.0);
        let (s3, cost) = s2.step(&e2, 5.0);

        assert_eq!(s3.rides, 2);
        assert_eq!(cost, 9.0);
    }

    #[test]
    fn queue_pops_smallest_first() {
        let mut heap = BinaryHeap::new();
        for d in [5.0, 1.0, 3.0] {
            heap.push(QueueEntry {
                dist: d,
                key: StateKey::start(id("A")),
            });
        }
        let order: Vec<f64> = std::iter::from_fn(|| heap.pop().map(|e| e.dist)).collect();
        assert_eq!(order, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn replay_empty_path() {
        assert_eq!(replay_minutes(&[], 5.0), 0.0);
    }

    #[test]
    fn broken_chain_yields_none() {
        let start = StateKey::start(id("A"));
        let orphan = StateKey {
            stop: id("Z"),
            mode: Some(TravelMode::Walk),
            route: None,
            direction: None,
            rides: 0,
        };
        let prev = HashMap::new();
        assert!(reconstruct(&prev, &start, &orphan).is_none());
        assert_eq!(reconstruct(&prev, &start, &start), Some(Vec::new()));
    }
}
