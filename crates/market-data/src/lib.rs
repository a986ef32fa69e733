//! Pricefeed Market Data Crate
//!
//! Upstream price sources for the pricefeed pipeline, and the rate limiter
//! that keeps every outbound request inside the source's budget.
//!
//! # Overview
//!
//! ```text
//! PriceSource::top_assets ─┐
//! PriceSource::top_venues ─┼──> RateLimiter::wait ──> upstream HTTP API
//! PriceSource::fetch_price ┘
//! ```
//!
//! # Core Types
//!
//! - [`PriceSource`] - Interface consumed by the fetch/aggregate engine
//! - [`CoinGeckoProvider`] - CoinGecko implementation of [`PriceSource`]
//! - [`RateLimiter`] - Sliding-window limiter shared by concurrent callers
//! - [`TrackedAsset`], [`PriceVenue`] - Ranked assets and price sources

pub mod errors;
pub mod models;
pub mod provider;
pub mod rate_limiter;

pub use errors::MarketDataError;
pub use models::{PriceVenue, TrackedAsset};
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::PriceSource;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
