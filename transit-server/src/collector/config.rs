//! Collector and scheduler configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::geo;

/// How a pass derives travel times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Geometry-derived estimates only; never calls the arrival API.
    #[default]
    Seed,
    /// Prefer real-time arrival differences, fall back to geometry.
    Refine,
}

impl CollectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionMode::Seed => "seed",
            CollectionMode::Refine => "refine",
        }
    }
}

impl fmt::Display for CollectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" => Ok(CollectionMode::Seed),
            "refine" => Ok(CollectionMode::Refine),
            other => Err(format!("unknown collection mode: {other}")),
        }
    }
}

/// Parameters for per-pair travel time estimation.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Assumed bus speed (km/h) for distance-derived estimates.
    pub bus_speed_kmh: f64,

    /// Lower clamp for distance-derived estimates (seconds).
    pub min_travel_sec: f64,

    /// Upper clamp for distance-derived estimates (seconds).
    pub max_travel_sec: f64,

    /// Arrival API calls allowed per route in refine mode.
    pub max_arrival_calls_per_route: usize,
}

impl CollectorConfig {
    /// Travel time estimate for `distance_m`, clamped to the configured range.
    pub fn estimate_seconds(&self, distance_m: f64) -> f64 {
        let max = self.max_travel_sec.max(self.min_travel_sec);
        geo::seconds_at_speed(distance_m, self.bus_speed_kmh).clamp(self.min_travel_sec, max)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bus_speed_kmh: 18.0,
            min_travel_sec: 20.0,
            max_travel_sec: 1200.0,
            max_arrival_calls_per_route: 30,
        }
    }
}

/// Parameters for the background collection loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub mode: CollectionMode,

    pub min_batch: usize,
    pub max_batch: usize,
    pub initial_batch: usize,

    /// Passes slower than this halve the batch size.
    pub slow_pass: Duration,

    /// Passes faster than this grow the batch size by one.
    pub fast_pass: Duration,

    /// Daily operating window, local time. The window may wrap past
    /// midnight; equal bounds mean all day.
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,

    /// Sleep between passes.
    pub interval: Duration,
}

impl SchedulerConfig {
    /// Batch size bounds, with `min >= 1` and `max >= min`.
    pub fn batch_bounds(&self) -> (usize, usize) {
        let min = self.min_batch.max(1);
        (min, self.max_batch.max(min))
    }

    /// Batch size for the pass after one that took `elapsed`.
    pub fn next_batch_size(&self, current: usize, elapsed: Duration) -> usize {
        let (min, max) = self.batch_bounds();
        let next = if elapsed > self.slow_pass {
            current / 2
        } else if elapsed < self.fast_pass {
            current.saturating_add(1)
        } else {
            current
        };
        next.clamp(min, max)
    }

    /// Whether `time` falls inside the operating window.
    pub fn in_window_at(&self, time: NaiveTime) -> bool {
        let (start, end) = (self.window_start, self.window_end);
        if start == end {
            true
        } else if start < end {
            start <= time && time < end
        } else {
            time >= start || time < end
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: CollectionMode::Seed,
            min_batch: 1,
            max_batch: 50,
            initial_batch: 5,
            slow_pass: Duration::from_secs(20),
            fast_pass: Duration::from_secs(5),
            window_start: NaiveTime::from_hms_opt(5, 0, 0).unwrap_or(NaiveTime::MIN),
            window_end: NaiveTime::from_hms_opt(23, 30, 0).unwrap_or(NaiveTime::MIN),
            interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn estimate_is_clamped() {
        let config = CollectorConfig::default();

        // 18 km/h is 5 m/s
        assert!((config.estimate_seconds(500.0) - 100.0).abs() < 1e-9);
        assert_eq!(config.estimate_seconds(10.0), 20.0);
        assert_eq!(config.estimate_seconds(100_000.0), 1200.0);

        let stalled = CollectorConfig {
            bus_speed_kmh: 0.0,
            ..CollectorConfig::default()
        };
        assert_eq!(stalled.estimate_seconds(500.0), 1200.0);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("seed".parse::<CollectionMode>(), Ok(CollectionMode::Seed));
        assert_eq!(" Refine ".parse::<CollectionMode>(), Ok(CollectionMode::Refine));
        assert!("turbo".parse::<CollectionMode>().is_err());
        assert_eq!(
            serde_json::to_string(&CollectionMode::Refine).unwrap(),
            r#""refine""#
        );
    }

    #[test]
    fn batch_adaptation() {
        let config = SchedulerConfig {
            min_batch: 2,
            max_batch: 10,
            ..SchedulerConfig::default()
        };

        assert_eq!(config.next_batch_size(8, Duration::from_secs(30)), 4);
        assert_eq!(config.next_batch_size(3, Duration::from_secs(30)), 2);
        assert_eq!(config.next_batch_size(8, Duration::from_secs(1)), 9);
        assert_eq!(config.next_batch_size(10, Duration::from_secs(1)), 10);
        assert_eq!(config.next_batch_size(6, Duration::from_secs(10)), 6);
    }

    #[test]
    fn inverted_bounds_are_repaired() {
        let config = SchedulerConfig {
            min_batch: 0,
            max_batch: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(config.batch_bounds(), (1, 1));
        assert_eq!(config.next_batch_size(5, Duration::from_secs(10)), 1);
    }

    #[test]
    fn daytime_window() {
        let config = SchedulerConfig::default();
        assert!(config.in_window_at(t(5, 0)));
        assert!(config.in_window_at(t(12, 0)));
        assert!(!config.in_window_at(t(23, 30)));
        assert!(!config.in_window_at(t(3, 0)));
    }

    #[test]
    fn window_wrapping_midnight() {
        let config = SchedulerConfig {
            window_start: t(22, 0),
            window_end: t(2, 0),
            ..SchedulerConfig::default()
        };
        assert!(config.in_window_at(t(23, 0)));
        assert!(config.in_window_at(t(1, 59)));
        assert!(!config.in_window_at(t(2, 0)));
        assert!(!config.in_window_at(t(12, 0)));
    }

    #[test]
    fn equal_bounds_mean_all_day() {
        let config = SchedulerConfig {
            window_start: t(0, 0),
            window_end: t(0, 0),
            ..SchedulerConfig::default()
        };
        assert!(config.in_window_at(t(0, 0)));
        assert!(config.in_window_at(t(13, 37)));
    }
}
