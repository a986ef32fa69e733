//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while talking to an upstream price source.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The upstream API answered with a non-success HTTP status.
    #[error("API request failed: {status} {body}")]
    UpstreamApi {
        /// HTTP status code returned by the source
        status: u16,
        /// Raw response body, kept for diagnostics
        body: String,
    },

    /// The upstream API rejected the request because of its own rate limit (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The source answered, but carried no usable price for the pair.
    #[error("No price for {asset} on {venue}")]
    MissingPrice {
        /// Upstream asset id
        asset: String,
        /// Upstream venue id
        venue: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode {
        /// Endpoint that produced the body
        endpoint: String,
        /// Decoder message
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Whether this error concerns a single observation rather than the whole source.
    ///
    /// Observation-level failures are dropped from aggregation; anything else
    /// during the ranking lookups aborts the tick.
    pub fn is_observation_level(&self) -> bool {
        matches!(self, Self::MissingPrice { .. })
    }
}
