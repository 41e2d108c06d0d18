//! Domain types for the transit planner.
//!
//! This module contains the core model types shared by the routing engine
//! and the segment-weight collector. Identifier types are cheap to clone
//! and validate their input at construction time, so code that receives
//! them can trust their validity.

mod edge;
mod error;
mod mode;
mod route;
mod stop;
mod weight;

pub use edge::Edge;
pub use error::DomainError;
pub use mode::TravelMode;
pub use route::{Direction, RouteId, StopOnRoute};
pub use stop::{StopId, StopPoint};
pub use weight::{SegmentWeight, WeightKey, WeightSample};
