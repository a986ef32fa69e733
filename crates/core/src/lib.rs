//! Pricefeed Core - Snapshot model, aggregation engine and pipeline.
//!
//! This crate contains the domain logic of the pricefeed service.
//! It is database-agnostic and defines the `SnapshotStore` trait that is
//! implemented by the `storage-sqlite` crate.
//!
//! ```text
//! PricePipeline::run_tick
//!   → PriceSource (ranked assets, ranked venues)
//!   → PriceAggregator (rate-limited fan-out, mean per asset)
//!   → SnapshotStore::append
//! ```

pub mod aggregation;
pub mod constants;
pub mod errors;
pub mod pipeline;
pub mod snapshots;
pub mod utils;

pub use aggregation::PriceAggregator;
pub use pipeline::{PipelineSettings, PricePipeline, TickOutcome};
pub use snapshots::{
    AssetSnapshot, HistoricalPoint, HistoricalPrices, LatestPrice, LatestPrices, Observation,
    Snapshot, SnapshotStore, TimeRange,
};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
