//! Per-request graph construction.

use crate::domain::{Edge, SegmentWeight, StopId, StopPoint};
use crate::geo;
use crate::planner::PlannerConfig;

use super::network::TransitGraph;
use super::rail::RailLine;

/// Endpoints of a routing request and how far they may snap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapQuery {
    pub origin: [f64; 2],
    pub destination: [f64; 2],

    /// Maximum walking distance (meters) from an endpoint to a stop.
    pub snap_radius_m: f64,
}

/// Builds the routing graph for one request.
pub struct GraphBuilder<'a> {
    config: &'a PlannerConfig,
    rail: &'a RailLine,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a PlannerConfig, rail: &'a RailLine) -> Self {
        Self { config, rail }
    }

    /// Assemble bus, rail, transfer and snap edges.
    ///
    /// `weights` should arrive in a stable order (the stores return them
    /// sorted by key) for the resulting adjacency lists to be identical
    /// across calls.
    pub fn build(&self, weights: &[SegmentWeight], query: &SnapQuery) -> TransitGraph {
        let mut graph = TransitGraph::new();

        self.add_bus_edges(&mut graph, weights);
        self.rail.add_to(&mut graph, self.config.rail_speed_kmh);
        self.add_transfer_edges(&mut graph);
        self.add_snap_edges(&mut graph, query);

        graph
    }

    /// One directed edge per weight row; never reversed, since a route
    /// direction is physically fixed.
    fn add_bus_edges(&self, graph: &mut TransitGraph, weights: &[SegmentWeight]) {
        for w in weights.iter().filter(|w| w.has_coordinates()) {
            graph.add_stop(StopPoint::new(w.key.from.clone(), w.from_lat, w.from_lng));
            graph.add_stop(StopPoint::new(w.key.to.clone(), w.to_lat, w.to_lng));
            graph.add_edge(Edge::bus(
                w.key.route.clone(),
                w.key.direction,
                w.key.from.clone(),
                w.key.to.clone(),
                w.minutes(),
            ));
        }
    }

    /// Walking links between each rail station and every non-rail stop
    /// within the transfer radius.
    fn add_transfer_edges(&self, graph: &mut TransitGraph) {
        let mut pairs = Vec::new();
        for station in self.rail.stations() {
            for stop in graph.stops() {
                if graph.is_rail_station(&stop.id) {
                    continue;
                }
                let d = geo::haversine_m(station.lat, station.lng, stop.lat, stop.lng);
                if d <= self.config.transfer_radius_m {
                    pairs.push((station.id.clone(), stop.id.clone(), d));
                }
            }
        }

        for (station, stop, d) in pairs {
            let minutes = geo::minutes_at_speed(d, self.config.walk_speed_kmh);
            graph.add_walk_pair(&station, &stop, minutes);
        }
    }

    /// START → every stop near the origin, every stop near the destination → END.
    fn add_snap_edges(&self, graph: &mut TransitGraph, query: &SnapQuery) {
        let start = StopId::start();
        let end = StopId::end();
        let radius = query.snap_radius_m.max(0.0);

        let mut snaps = Vec::new();
        for stop in graph.stops() {
            let to_origin = geo::distance_m(query.origin, stop.coords());
            if to_origin <= radius {
                snaps.push(Edge::walk(
                    start.clone(),
                    stop.id.clone(),
                    geo::minutes_at_speed(to_origin, self.config.walk_speed_kmh),
                ));
            }

            let to_destination = geo::distance_m(stop.coords(), query.destination);
            if to_destination <= radius {
                snaps.push(Edge::walk(
                    stop.id.clone(),
                    end.clone(),
                    geo::minutes_at_speed(to_destination, self.config.walk_speed_kmh),
                ));
            }
        }

        graph.add_stop(StopPoint::new(start, query.origin[0], query.origin[1]));
        graph.add_stop(StopPoint::new(end, query.destination[0], query.destination[1]));
        for edge in snaps {
            graph.add_edge(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{Direction, RouteId, TravelMode, WeightKey, WeightSample};
    use crate::graph::RailStation;

    fn id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    fn weight(route: &str, from: &str, to: &str, a: [f64; 2], b: [f64; 2], sec: f64) -> SegmentWeight {
        SegmentWeight::first(
            &WeightSample {
                key: WeightKey {
                    route: RouteId::parse(route).unwrap(),
                    direction: Direction::OUTBOUND,
                    from: id(from),
                    to: id(to),
                },
                from_coords: a,
                to_coords: b,
                distance_m: geo::distance_m(a, b),
                travel_sec: sec,
            },
            Utc::now(),
        )
    }

    fn one_station_line(lat: f64, lng: f64) -> RailLine {
        RailLine::new(
            RouteId::parse("L").unwrap(),
            vec![RailStation {
                id: id("R1"),
                name: "Rail One".into(),
                lat,
                lng,
            }],
        )
    }

    fn empty_line() -> RailLine {
        RailLine::new(RouteId::parse("L").unwrap(), Vec::new())
    }

    fn far_query() -> SnapQuery {
        SnapQuery {
            origin: [0.0, 0.0],
            destination: [0.0, 0.0],
            snap_radius_m: 10.0,
        }
    }

    #[test]
    fn bus_edges_are_one_way() {
        let config = PlannerConfig::default();
        let line = empty_line();
        let weights = vec![weight("R1", "A", "B", [35.0, 128.0], [35.001, 128.0], 120.0)];

        let g = GraphBuilder::new(&config, &line).build(&weights, &far_query());

        let out = g.outgoing(&id("A"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].mode, TravelMode::Bus);
        assert_eq!(out[0].minutes, 2.0);
        assert!(g.outgoing(&id("B")).is_empty());
    }

    #[test]
    fn bus_edge_weight_floor() {
        let config = PlannerConfig::default();
        let line = empty_line();
        let weights = vec![weight("R1", "A", "B", [35.0, 128.0], [35.001, 128.0], 0.0)];

        let g = GraphBuilder::new(&config, &line).build(&weights, &far_query());
        assert_eq!(g.outgoing(&id("A"))[0].minutes, 0.1);
    }

    #[test]
    fn transfer_edges_within_radius_only() {
        let config = PlannerConfig::default();
        let line = one_station_line(35.0, 128.0);
        let weights = vec![
            // ~111 m north of the station
            weight("R1", "NEAR", "FAR", [35.001, 128.0], [35.02, 128.0], 60.0),
        ];

        let g = GraphBuilder::new(&config, &line).build(&weights, &far_query());

        let from_station: Vec<_> = g
            .outgoing(&id("R1"))
            .iter()
            .filter(|e| e.mode == TravelMode::Walk)
            .collect();
        assert_eq!(from_station.len(), 1);
        assert_eq!(from_station[0].to, id("NEAR"));
        assert!(
            g.outgoing(&id("NEAR"))
                .iter()
                .any(|e| e.mode == TravelMode::Walk && e.to == id("R1"))
        );
        assert!(g.outgoing(&id("FAR")).is_empty());
    }

    #[test]
    fn snap_edges_connect_endpoints() {
        let config = PlannerConfig::default();
        let line = empty_line();
        let weights = vec![weight("R1", "A", "B", [35.0, 128.0], [35.01, 128.0], 300.0)];
        let query = SnapQuery {
            origin: [35.0005, 128.0],
            destination: [35.0105, 128.0],
            snap_radius_m: 100.0,
        };

        let g = GraphBuilder::new(&config, &line).build(&weights, &query);

        let from_start = g.outgoing(&StopId::start());
        assert_eq!(from_start.len(), 1);
        assert_eq!(from_start[0].to, id("A"));

        assert!(g.outgoing(&id("B")).iter().any(|e| e.to == StopId::end()));
        assert!(g.stop(&StopId::start()).is_some());
        assert!(g.stop(&StopId::end()).is_some());
    }

    #[test]
    fn zero_snap_radius_only_matches_exact_coordinates() {
        let config = PlannerConfig::default();
        let line = empty_line();
        let weights = vec![weight("R1", "A", "B", [35.0, 128.0], [35.01, 128.0], 300.0)];
        let query = SnapQuery {
            origin: [35.0, 128.0],
            destination: [35.0001, 128.0],
            snap_radius_m: 0.0,
        };

        let g = GraphBuilder::new(&config, &line).build(&weights, &query);

        assert_eq!(g.outgoing(&StopId::start()).len(), 1);
        assert!(!g.outgoing(&id("B")).iter().any(|e| e.to == StopId::end()));
    }

    #[test]
    fn rows_without_coordinates_are_skipped() {
        let config = PlannerConfig::default();
        let line = empty_line();
        let weights = vec![weight("R1", "A", "B", [f64::NAN, 128.0], [35.0, 128.0], 60.0)];

        let g = GraphBuilder::new(&config, &line).build(&weights, &far_query());
        assert!(g.outgoing(&id("A")).is_empty());
    }

    #[test]
    fn construction_is_deterministic() {
        let config = PlannerConfig::default();
        let line = RailLine::light_rail();
        let weights = vec![
            weight("R1", "A", "B", [35.885, 128.598], [35.879, 128.6047], 200.0),
            weight("R2", "B", "C", [35.879, 128.6047], [35.874, 128.613], 200.0),
        ];
        let query = SnapQuery {
            origin: [35.885, 128.598],
            destination: [35.874, 128.613],
            snap_radius_m: 800.0,
        };

        let builder = GraphBuilder::new(&config, &line);
        let g1 = builder.build(&weights, &query);
        let g2 = builder.build(&weights, &query);

        assert_eq!(g1.edge_count(), g2.edge_count());
        for stop in g1.stops() {
            assert_eq!(g1.outgoing(&stop.id), g2.outgoing(&stop.id));
        }
    }
}
