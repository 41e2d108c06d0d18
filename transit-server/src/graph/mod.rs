//! Routing graph assembly.
//!
//! A fresh graph is built for every routing request from three sources:
//! persisted bus segment weights, the fixed light-rail line, and derived
//! walking edges (rail transfers and snaps to the request endpoints).
//! Building never writes back to any of its inputs.

mod builder;
mod network;
mod rail;

pub use builder::{GraphBuilder, SnapQuery};
pub use network::TransitGraph;
pub use rail::{RailLine, RailStation};
