//! Fair route rotation across collection passes.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::domain::RouteId;

#[derive(Debug, Default)]
struct Rotation {
    cursor: usize,
    visited: HashSet<RouteId>,
}

/// Round-robin cursor plus the set of routes visited in the current cycle.
///
/// Selection is one critical section, so a manual pass racing a scheduled
/// one can never pick the same route twice in a cycle.
#[derive(Debug, Default)]
pub struct RoundRobin {
    state: Mutex<Rotation>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up to `batch` unvisited routes, starting at the cursor and
    /// wrapping around `routes`.
    ///
    /// When every listed route has been visited, a new cycle starts.
    pub fn select(&self, routes: &[RouteId], batch: usize) -> Vec<RouteId> {
        if routes.is_empty() || batch == 0 {
            return Vec::new();
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if routes.iter().all(|r| state.visited.contains(r)) {
            state.visited.clear();
        }

        let len = routes.len();
        let start = state.cursor % len;
        let mut selected = Vec::with_capacity(batch.min(len));

        for offset in 0..len {
            if selected.len() == batch {
                break;
            }
            let index = (start + offset) % len;
            let route = &routes[index];
            if state.visited.insert(route.clone()) {
                selected.push(route.clone());
                state.cursor = (index + 1) % len;
            }
        }

        selected
    }

    /// Routes visited so far in the current cycle.
    pub fn visited_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .visited
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes(ids: &[&str]) -> Vec<RouteId> {
        ids.iter().map(|s| RouteId::parse(s).unwrap()).collect()
    }

    #[test]
    fn three_routes_batch_of_two() {
        let rr = RoundRobin::new();
        let all = routes(&["R1", "R2", "R3"]);

        assert_eq!(rr.select(&all, 2), routes(&["R1", "R2"]));
        assert_eq!(rr.select(&all, 2), routes(&["R3"]));
        assert_eq!(rr.select(&all, 2), routes(&["R1", "R2"]));
    }

    #[test]
    fn batch_larger_than_list() {
        let rr = RoundRobin::new();
        let all = routes(&["R1", "R2"]);
        assert_eq!(rr.select(&all, 10), all);
        assert_eq!(rr.select(&all, 10), all);
    }

    #[test]
    fn empty_inputs() {
        let rr = RoundRobin::new();
        assert!(rr.select(&[], 3).is_empty());
        assert!(rr.select(&routes(&["R1"]), 0).is_empty());
        assert_eq!(rr.visited_count(), 0);
    }

    #[test]
    fn list_changes_between_passes() {
        let rr = RoundRobin::new();
        assert_eq!(rr.select(&routes(&["R1", "R2", "R3"]), 2), routes(&["R1", "R2"]));

        // R3 disappeared and R4 appeared; the visited set still holds R1 and R2.
        let next = routes(&["R1", "R2", "R4"]);
        assert_eq!(rr.select(&next, 2), routes(&["R4"]));
        assert_eq!(rr.select(&next, 2), routes(&["R1", "R2"]));
    }

    #[test]
    fn every_route_visited_once_per_cycle() {
        let rr = RoundRobin::new();
        let all = routes(&["A", "B", "C", "D", "E", "F", "G"]);

        let mut seen = Vec::new();
        while seen.len() < all.len() {
            seen.extend(rr.select(&all, 3));
        }
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(seen.len(), all.len());
    }
}
