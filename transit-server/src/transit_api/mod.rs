//! Transit data service client.
//!
//! This module provides an HTTP client for the public transit data service,
//! which lists routes, their ordered stops, and real-time arrival
//! predictions per stop.
//!
//! Key characteristics of the service:
//! - Every response carries a result code; `"22"` means the daily request
//!   allowance is spent and nothing more will be answered today
//! - Unknown stop coordinates are reported as `(0, 0)`
//! - Calls are metered, so production code goes through [`QuotaGatedSource`]

mod client;
mod error;
mod gate;
mod mock;
mod source;
mod types;

pub use client::{TransitApiClient, TransitApiConfig};
pub use error::TransitApiError;
pub use gate::QuotaGatedSource;
pub use mock::{CallCounts, MockTransitSource};
pub use source::TransitDataSource;
pub use types::Arrival;
