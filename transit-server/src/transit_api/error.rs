//! Transit data service error types.

/// Errors from the transit data service and the quota gate in front of it.
#[derive(Debug, thiserror::Error)]
pub enum TransitApiError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", .body.as_deref().map(|b| format!(" (body: {b})")).unwrap_or_default())]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code or result code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid API key or unauthorized
    #[error("unauthorized (check TRANSIT_API_KEY)")]
    Unauthorized,

    /// Throttled by the service for this moment; retrying later may work
    #[error("rate limited by transit API")]
    RateLimited,

    /// The service reports the daily request allowance as spent
    #[error("transit API reports daily quota exceeded")]
    QuotaExceeded,

    /// The local daily budget refused the call; nothing was sent
    #[error("local daily API budget exhausted")]
    QuotaExhausted,

    /// Requested route or stop is unknown to the service
    #[error("not found: {0}")]
    NotFound(String),
}

impl TransitApiError {
    /// Whether the service itself signalled that today's allowance is gone.
    pub fn is_over_quota(&self) -> bool {
        matches!(self, TransitApiError::QuotaExceeded)
    }

    /// Whether the call never left the process because the budget refused it.
    pub fn is_refused_locally(&self) -> bool {
        matches!(self, TransitApiError::QuotaExhausted)
    }
}
