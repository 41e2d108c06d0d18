//! Segment weight persistence.
//!
//! The collector folds timing samples into running averages here; the
//! planner reads every row to build its routing graph. Rows are keyed by
//! (route, direction, from stop, to stop) and an upsert of one key is
//! atomic with respect to concurrent upserts of the same key.

mod error;
mod file;
mod memory;

use std::future::Future;

use crate::domain::{SegmentWeight, WeightKey, WeightSample};

pub use error::StoreError;
pub use file::FileWeightStore;
pub use memory::MemoryWeightStore;

/// Storage for segment weights.
pub trait SegmentWeightStore: Send + Sync {
    /// Insert a first sample or fold another one into the running average.
    /// Returns the row as stored.
    fn upsert_sample(
        &self,
        sample: WeightSample,
    ) -> impl Future<Output = Result<SegmentWeight, StoreError>> + Send;

    fn get(
        &self,
        key: &WeightKey,
    ) -> impl Future<Output = Result<Option<SegmentWeight>, StoreError>> + Send;

    /// Every row, sorted by key.
    fn all(&self) -> impl Future<Output = Result<Vec<SegmentWeight>, StoreError>> + Send;

    /// Make pending changes durable. A no-op for volatile stores.
    fn flush(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async { Ok(()) }
    }
}

/// Reject samples that would poison a running average.
fn validate(sample: &WeightSample) -> Result<(), StoreError> {
    if !sample.travel_sec.is_finite() || sample.travel_sec < 0.0 {
        return Err(StoreError::InvalidSample(format!(
            "travel time {} for {} {} -> {}",
            sample.travel_sec, sample.key.route, sample.key.from, sample.key.to
        )));
    }
    Ok(())
}
