//! In-memory weight store.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{SegmentWeight, WeightKey, WeightSample};

use super::error::StoreError;
use super::{SegmentWeightStore, validate};

/// Volatile store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryWeightStore {
    rows: RwLock<BTreeMap<WeightKey, SegmentWeight>>,
}

impl MemoryWeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing rows.
    pub fn from_rows(rows: impl IntoIterator<Item = SegmentWeight>) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().map(|w| (w.key.clone(), w)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl SegmentWeightStore for MemoryWeightStore {
    async fn upsert_sample(&self, sample: WeightSample) -> Result<SegmentWeight, StoreError> {
        validate(&sample)?;
        let now = Utc::now();

        let mut rows = self.rows.write().await;
        let row = rows
            .entry(sample.key.clone())
            .and_modify(|w| w.absorb(&sample, now))
            .or_insert_with(|| SegmentWeight::first(&sample, now));
        Ok(row.clone())
    }

    async fn get(&self, key: &WeightKey) -> Result<Option<SegmentWeight>, StoreError> {
        Ok(self.rows.read().await.get(key).cloned())
    }

    async fn all(&self) -> Result<Vec<SegmentWeight>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}
