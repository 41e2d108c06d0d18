//! Web layer for the transit journey planner.
//!
//! Provides HTTP endpoints for planning journeys, controlling the segment
//! weight collector, and inspecting the daily API budget.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
