//! Background driver for collection passes.
//!
//! One tokio task sleeps for the configured interval, then runs a pass if
//! the loop is enabled and the local time is inside the operating window.
//! After each scheduled pass the batch size adapts to how long it took.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveTime};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::SegmentWeightStore;
use crate::transit_api::TransitDataSource;

use super::collect::{PassReport, SegmentWeightCollector};
use super::config::{CollectionMode, SchedulerConfig};

/// Sentinel for "no pass has finished yet".
const NO_PASS: u64 = u64::MAX;

/// Snapshot of the scheduler for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub in_progress: bool,
    pub in_window: bool,
    pub batch_size: usize,
    pub interval_secs: u64,
    pub mode: CollectionMode,
    pub last_pass_ms: Option<u64>,
    pub last_report: Option<PassReport>,
}

/// Clears the in-progress flag when a pass ends, however it ends.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Periodic, self-tuning collection loop.
pub struct CollectionScheduler<S, W> {
    collector: Arc<SegmentWeightCollector<S, W>>,
    config: SchedulerConfig,

    enabled: AtomicBool,
    in_progress: AtomicBool,
    stopped: AtomicBool,
    batch_size: AtomicUsize,
    interval_secs: AtomicU64,
    mode: Mutex<CollectionMode>,
    wake: Notify,

    last_pass_ms: AtomicU64,
    last_report: Mutex<Option<PassReport>>,
}

impl<S, W> CollectionScheduler<S, W>
where
    S: TransitDataSource + 'static,
    W: SegmentWeightStore + 'static,
{
    pub fn new(collector: Arc<SegmentWeightCollector<S, W>>, config: SchedulerConfig) -> Self {
        let (min, max) = config.batch_bounds();
        Self {
            collector,
            enabled: AtomicBool::new(config.enabled),
            in_progress: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            batch_size: AtomicUsize::new(config.initial_batch.clamp(min, max)),
            interval_secs: AtomicU64::new(config.interval.as_secs().max(1)),
            mode: Mutex::new(config.mode),
            wake: Notify::new(),
            last_pass_ms: AtomicU64::new(NO_PASS),
            last_report: Mutex::new(None),
            config,
        }
    }

    /// Start the background loop.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run_loop().await })
    }

    async fn run_loop(&self) {
        info!(
            enabled = self.is_enabled(),
            interval_secs = self.interval_secs.load(Ordering::SeqCst),
            "collection scheduler started"
        );

        while !self.stopped.load(Ordering::SeqCst) {
            if self.is_enabled() && self.in_window_now() {
                let batch = self.batch_size.load(Ordering::SeqCst);
                if let Some(report) = self.run_guarded(batch, self.mode()).await {
                    let elapsed = Duration::from_millis(report.duration_ms);
                    let next = self.config.next_batch_size(batch, elapsed);
                    if next != batch {
                        debug!(from = batch, to = next, "batch size adapted");
                    }
                    self.batch_size.store(next, Ordering::SeqCst);
                }
            }

            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            let interval = Duration::from_secs(self.interval_secs.load(Ordering::SeqCst));
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.wake.notified() => {}
            }
        }

        info!("collection scheduler stopped");
    }

    /// Run one pass now, regardless of the toggle and the window.
    ///
    /// Returns `None` if a pass is already in progress. Defaults to the
    /// current batch size and mode.
    pub async fn run_once(
        &self,
        batch_size: Option<usize>,
        mode: Option<CollectionMode>,
    ) -> Option<PassReport> {
        let batch = batch_size
            .filter(|&b| b > 0)
            .unwrap_or_else(|| self.batch_size.load(Ordering::SeqCst));
        self.run_guarded(batch, mode.unwrap_or_else(|| self.mode()))
            .await
    }

    async fn run_guarded(&self, batch: usize, mode: CollectionMode) -> Option<PassReport> {
        let _guard = self.try_begin()?;

        let report = self.collector.run_pass(batch, mode).await;
        self.last_pass_ms.store(report.duration_ms, Ordering::SeqCst);
        *self
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Some(report)
    }

    fn try_begin(&self) -> Option<PassGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PassGuard(&self.in_progress))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::SeqCst);
        if was != enabled {
            info!(enabled, "collection loop toggled");
            self.wake.notify_one();
        }
    }

    /// Change the sleep between passes; takes effect on the next iteration.
    pub fn set_interval(&self, interval: Duration) {
        let secs = interval.as_secs().max(1);
        self.interval_secs.store(secs, Ordering::SeqCst);
        info!(interval_secs = secs, "collection interval changed");
        self.wake.notify_one();
    }

    pub fn mode(&self) -> CollectionMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_mode(&self, mode: CollectionMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// Ask the loop to exit at its next check.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn in_window_at(&self, time: NaiveTime) -> bool {
        self.config.in_window_at(time)
    }

    fn in_window_now(&self) -> bool {
        self.in_window_at(Local::now().time())
    }

    pub fn status(&self) -> SchedulerStatus {
        let last = self.last_pass_ms.load(Ordering::SeqCst);
        SchedulerStatus {
            enabled: self.is_enabled(),
            in_progress: self.in_progress.load(Ordering::SeqCst),
            in_window: self.in_window_now(),
            batch_size: self.batch_size.load(Ordering::SeqCst),
            interval_secs: self.interval_secs.load(Ordering::SeqCst),
            mode: self.mode(),
            last_pass_ms: (last != NO_PASS).then_some(last),
            last_report: self
                .last_report
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}
