//! JSON-file-backed weight store.
//!
//! Rows are held in memory and written out as a whole-file snapshot on
//! [`flush`](SegmentWeightStore::flush). The snapshot is written to a
//! temporary sibling first and renamed into place, so a crash mid-write
//! leaves the previous snapshot intact.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{SegmentWeight, WeightKey, WeightSample};

use super::error::StoreError;
use super::memory::MemoryWeightStore;
use super::SegmentWeightStore;

/// Snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// On-disk snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    weights: Vec<SegmentWeight>,
}

/// Weight store persisted to a JSON file.
#[derive(Debug)]
pub struct FileWeightStore {
    path: PathBuf,
    rows: MemoryWeightStore,
    dirty: AtomicBool,

    /// Serializes concurrent flushes.
    write_lock: Mutex<()>,
}

impl FileWeightStore {
    /// Open the store at `path`, loading any existing snapshot.
    ///
    /// A missing file is an empty store; an unreadable one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let weights = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let snapshot: Snapshot =
                    serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(StoreError::Corrupt {
                        path,
                        message: format!("unsupported snapshot version {}", snapshot.version),
                    });
                }
                snapshot.weights
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        info!(path = %path.display(), rows = weights.len(), "weight store opened");

        Ok(Self {
            path,
            rows: MemoryWeightStore::from_rows(weights),
            dirty: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are changes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}

impl SegmentWeightStore for FileWeightStore {
    async fn upsert_sample(&self, sample: WeightSample) -> Result<SegmentWeight, StoreError> {
        let row = self.rows.upsert_sample(sample).await?;
        self.dirty.store(true, Ordering::SeqCst);
        Ok(row)
    }

    async fn get(&self, key: &WeightKey) -> Result<Option<SegmentWeight>, StoreError> {
        self.rows.get(key).await
    }

    async fn all(&self) -> Result<Vec<SegmentWeight>, StoreError> {
        self.rows.all().await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            weights: self.rows.all().await?,
        };
        let rows = snapshot.weights.len();
        let json = serde_json::to_string_pretty(&snapshot)?;

        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))
            .and_then(|r| r);

        if result.is_err() {
            // Keep the changes pending so the next flush retries them.
            self.dirty.store(true, Ordering::SeqCst);
        } else {
            debug!(path = %self.path.display(), rows, "weight snapshot written");
        }
        result
    }
}

/// Write `contents` to a temporary sibling of `path`, then rename it over
/// `path`. Creates parent directories if they don't exist.
fn write_atomically(path: &Path, contents: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
