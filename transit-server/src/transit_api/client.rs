//! Transit data service HTTP client.
//!
//! Provides async methods for querying routes, route stop lists and
//! real-time arrivals. Handles authentication, bounded concurrency and
//! conversion to domain types.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::domain::{RouteId, StopId, StopOnRoute};

use super::error::TransitApiError;
use super::source::TransitDataSource;
use super::types::{
    Arrival, ArrivalsBody, Envelope, RouteDetailBody, RouteListBody, RouteStopsBody,
};

/// Default base URL for the transit data service.
const DEFAULT_BASE_URL: &str = "https://apis.transit-data.example/v1";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the transit API client.
#[derive(Debug, Clone)]
pub struct TransitApiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransitApiConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Transit data service client.
///
/// Uses a semaphore to limit concurrent requests, and a request timeout so
/// a stalled service fails the call instead of hanging the collector.
#[derive(Debug, Clone)]
pub struct TransitApiClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl TransitApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TransitApiConfig) -> Result<Self, TransitApiError> {
        let mut headers = HeaderMap::new();

        let api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| TransitApiError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
        headers.insert("x-apikey", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Issue a GET and decode the enveloped body.
    ///
    /// Returns `Ok(None)` when the service reports "no data".
    async fn get_enveloped<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, TransitApiError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| TransitApiError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TransitApiError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            // The service uses 429 only once the daily allowance is gone.
            return Err(TransitApiError::QuotaExceeded);
        }

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(TransitApiError::RateLimited);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TransitApiError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransitApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| TransitApiError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        envelope.into_body()
    }
}

impl TransitDataSource for TransitApiClient {
    async fn route_list(&self) -> Result<Vec<RouteId>, TransitApiError> {
        let body: Option<RouteListBody> = self.get_enveloped("/routes", &[]).await?;

        Ok(body
            .unwrap_or_default()
            .routes
            .into_iter()
            .filter_map(|r| RouteId::parse(&r.route_id).ok())
            .collect())
    }

    async fn route_stops(&self, route: &RouteId) -> Result<Vec<StopOnRoute>, TransitApiError> {
        let path = format!("/routes/{}/stops", route.as_str());
        let body: Option<RouteStopsBody> = self.get_enveloped(&path, &[]).await?;

        Ok(body
            .unwrap_or_default()
            .stops
            .into_iter()
            .filter_map(|s| s.into_domain())
            .collect())
    }

    async fn stop_arrivals(
        &self,
        stop: &StopId,
        route: &RouteId,
    ) -> Result<Vec<Arrival>, TransitApiError> {
        let path = format!("/stops/{}/arrivals", stop.as_str());
        let body: Option<ArrivalsBody> = self
            .get_enveloped(&path, &[("routeId", route.as_str())])
            .await?;

        Ok(body
            .unwrap_or_default()
            .arrivals
            .into_iter()
            .filter_map(|a| a.into_domain())
            .filter(|a| &a.route == route)
            .collect())
    }

    async fn route_number(&self, route: &RouteId) -> Result<String, TransitApiError> {
        let path = format!("/routes/{}", route.as_str());
        let body: Option<RouteDetailBody> = self.get_enveloped(&path, &[]).await?;

        body.and_then(|b| b.route_no)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| TransitApiError::NotFound(format!("route number for {route}")))
    }
}
