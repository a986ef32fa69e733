//! Price source abstractions and implementations.
//!
//! This module contains:
//! - The `PriceSource` trait consumed by the aggregation pipeline
//! - The CoinGecko implementation

mod traits;

pub mod coingecko;

pub use traits::PriceSource;
