//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::collector::{CollectionMode, CollectorConfig, SchedulerConfig};
use crate::planner::PlannerConfig;
use crate::transit_api::TransitApiConfig;

/// Default daily transit API allowance.
const DEFAULT_DAILY_QUOTA: u64 = 10_000;

/// Default snapshot path for segment weights.
const DEFAULT_STORE_PATH: &str = "segment_weights.json";

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// A configuration variable held a value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {name}: {value:?} ({reason})")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: TransitApiConfig,
    pub daily_quota: u64,
    pub store_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub planner: PlannerConfig,
    pub collector: CollectorConfig,
    pub scheduler: SchedulerConfig,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value if set.
    ///
    /// Unset or blank variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("TRANSIT_API_KEY").unwrap_or_default();
        let mut api = TransitApiConfig::new(api_key);
        if let Some(url) = var("TRANSIT_API_BASE_URL") {
            api = api.with_base_url(url.trim());
        }
        if let Some(secs) = parsed::<u64>("TRANSIT_API_TIMEOUT_SECS", var("TRANSIT_API_TIMEOUT_SECS"))? {
            api = api.with_timeout(secs);
        }

        let daily_quota =
            parsed::<u64>("TRANSIT_DAILY_QUOTA", var("TRANSIT_DAILY_QUOTA"))?.unwrap_or(DEFAULT_DAILY_QUOTA);

        let store_path = var("WEIGHT_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        let bind_addr: SocketAddr = match var("BIND_ADDR") {
            Some(addr) => parse("BIND_ADDR", &addr)?,
            None => parse("BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };

        let mut scheduler = SchedulerConfig::default();
        if let Some(enabled) = var("COLLECTOR_ENABLED") {
            scheduler.enabled = parse_bool("COLLECTOR_ENABLED", &enabled)?;
        }
        if let Some(secs) = parsed::<u64>("COLLECTOR_INTERVAL_SECS", var("COLLECTOR_INTERVAL_SECS"))? {
            scheduler.interval = Duration::from_secs(secs.max(1));
        }
        if let Some(start) = var("COLLECTOR_WINDOW_START") {
            scheduler.window_start = parse_time("COLLECTOR_WINDOW_START", &start)?;
        }
        if let Some(end) = var("COLLECTOR_WINDOW_END") {
            scheduler.window_end = parse_time("COLLECTOR_WINDOW_END", &end)?;
        }
        if let Some(mode) = var("COLLECTOR_MODE") {
            scheduler.mode = mode.parse::<CollectionMode>().map_err(|reason| ConfigError {
                name: "COLLECTOR_MODE",
                value: mode,
                reason,
            })?;
        }

        Ok(Self {
            api,
            daily_quota,
            store_path,
            bind_addr,
            planner: PlannerConfig::default(),
            collector: CollectorConfig::default(),
            scheduler,
        })
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parsed<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.map(|v| parse(name, &v)).transpose()
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            name,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
fn parse_time(name: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    let v = value.trim();
    NaiveTime::parse_from_str(v, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(v, "%H:%M:%S"))
        .map_err(|e| ConfigError {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}
