//! Journey planner over the transit graph.
//!
//! This module answers: "what is the fastest way from here to there, for
//! each number of vehicles I'm willing to board?"
//!
//! A request builds a fresh graph from the stored segment weights, runs a
//! ride-constrained Dijkstra search that keeps the best arrival per ride
//! count, and turns each resulting path into a segmented itinerary.

mod assemble;
mod config;
mod search;
mod solve;


pub use assemble::{Itinerary, Segment, assemble, split_segments};
pub use config::PlannerConfig;
pub use search::{BucketPath, Router, SearchOutcome, StateKey, replay_minutes};
pub use solve::{JourneyPlanner, PlanError, PlanResult, SolveRequest};
