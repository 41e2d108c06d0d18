//! Multi-modal transit journey planner server.
//!
//! Answers "how do I get from here to there by bus, light rail and on
//! foot?" over a graph of segment travel times. The travel times are
//! collected in the background from a metered transit data service, within
//! a daily request budget.

pub mod cache;
pub mod collector;
pub mod config;
pub mod domain;
pub mod geo;
pub mod graph;
pub mod names;
pub mod planner;
pub mod quota;
pub mod store;
pub mod transit_api;
pub mod web;
