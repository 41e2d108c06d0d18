//! Segment weight collection.
//!
//! The collector walks bus routes in round-robin order, times every pair
//! of consecutive stops (from real-time arrivals or from distance), and
//! folds the timings into the weight store. The scheduler drives it in the
//! background within a daily operating window.

mod collect;
mod config;
mod round_robin;
mod scheduler;

pub use collect::{PassReport, SegmentWeightCollector};
pub use config::{CollectionMode, CollectorConfig, SchedulerConfig};
pub use round_robin::RoundRobin;
pub use scheduler::{CollectionScheduler, SchedulerStatus};
