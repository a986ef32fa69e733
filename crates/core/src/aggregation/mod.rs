//! Fetch/aggregate engine.
//!
//! Fans out one price request per (asset, venue) pair, waits for all of them
//! to settle and reduces each asset's successes into an [`AssetSnapshot`].
//!
//! [`AssetSnapshot`]: crate::snapshots::AssetSnapshot

mod aggregator;

pub use aggregator::PriceAggregator;
