//! Directed graph edges.

use super::mode::TravelMode;
use super::route::{Direction, RouteId};
use super::stop::StopId;

/// A directed arc of the routing graph.
///
/// Edges are produced once per routing request from persisted and derived
/// data and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub mode: TravelMode,

    /// Route or line travelled; `None` for walking.
    pub route: Option<RouteId>,

    /// Direction code; only meaningful for buses.
    pub direction: Option<Direction>,

    pub from: StopId,
    pub to: StopId,

    /// Traversal time in minutes.
    pub minutes: f64,
}

impl Edge {
    /// A walking edge.
    pub fn walk(from: StopId, to: StopId, minutes: f64) -> Self {
        Self {
            mode: TravelMode::Walk,
            route: None,
            direction: None,
            from,
            to,
            minutes,
        }
    }

    /// A bus edge along `route` in `direction`.
    pub fn bus(route: RouteId, direction: Direction, from: StopId, to: StopId, minutes: f64) -> Self {
        Self {
            mode: TravelMode::Bus,
            route: Some(route),
            direction: Some(direction),
            from,
            to,
            minutes,
        }
    }

    /// A rail edge on `line`.
    pub fn rail(line: RouteId, from: StopId, to: StopId, minutes: f64) -> Self {
        Self {
            mode: TravelMode::Rail,
            route: Some(line),
            direction: None,
            from,
            to,
            minutes,
        }
    }

    /// Traversal cost used by the search: negative or NaN times count as zero.
    pub fn cost(&self) -> f64 {
        if self.minutes.is_nan() {
            0.0
        } else {
            self.minutes.max(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    #[test]
    fn constructors_set_mode_fields() {
        let w = Edge::walk(id("A"), id("B"), 3.0);
        assert_eq!(w.mode, TravelMode::Walk);
        assert!(w.route.is_none() && w.direction.is_none());

        let r = RouteId::parse("R1").unwrap();
        let b = Edge::bus(r.clone(), Direction::INBOUND, id("A"), id("B"), 2.0);
        assert_eq!(b.route, Some(r));
        assert_eq!(b.direction, Some(Direction::INBOUND));

        let l = Edge::rail(RouteId::parse("LRT").unwrap(), id("A"), id("B"), 2.0);
        assert!(l.direction.is_none());
    }

    #[test]
    fn cost_clamps_negative_and_nan() {
        assert_eq!(Edge::walk(id("A"), id("A"), -4.0).cost(), 0.0);
        assert_eq!(Edge::walk(id("A"), id("B"), f64::NAN).cost(), 0.0);
        assert_eq!(Edge::walk(id("A"), id("B"), 2.5).cost(), 2.5);
    }
}
