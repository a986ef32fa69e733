//! Price source trait definition.
//!
//! This module defines the `PriceSource` trait, the interface the fetch and
//! aggregation pipeline consumes from an upstream market data provider.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{PriceVenue, TrackedAsset};

/// Upstream source of ranked assets, ranked venues and per-venue prices.
///
/// Implementations are expected to gate every outbound request through a
/// shared [`RateLimiter`](crate::RateLimiter); callers issue requests
/// concurrently and rely on the source to stay inside its budget.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use pricefeed_market_data::{MarketDataError, PriceSource, PriceVenue, TrackedAsset};
///
/// struct FixedSource;
///
/// #[async_trait]
/// impl PriceSource for FixedSource {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     // ... implement ranking and price methods
/// }
/// ```
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Unique identifier for this source, used in logs.
    fn id(&self) -> &'static str;

    /// The top `limit` assets ordered by market weight (e.g. market cap).
    async fn top_assets(&self, limit: usize) -> Result<Vec<TrackedAsset>, MarketDataError>;

    /// The top `limit` venues ordered by traded volume.
    async fn top_venues(&self, limit: usize) -> Result<Vec<PriceVenue>, MarketDataError>;

    /// The current price of `asset` on `venue`.
    ///
    /// Returns [`MarketDataError::MissingPrice`] when the venue does not quote
    /// the asset, or quotes a non-positive price.
    async fn fetch_price(
        &self,
        asset: &TrackedAsset,
        venue: &PriceVenue,
    ) -> Result<Decimal, MarketDataError>;
}
