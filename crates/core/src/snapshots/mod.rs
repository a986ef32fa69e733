//! Price snapshots: the domain model and the storage interface.
//!
//! - [`model`] - Observations, per-asset snapshots, query results
//! - [`store`] - The `SnapshotStore` trait implemented by storage backends

pub mod model;
pub mod store;

pub use model::{
    AssetSnapshot, HistoricalPoint, HistoricalPrices, LatestPrice, LatestPrices, Observation,
    Snapshot, TimeRange,
};
pub use store::SnapshotStore;
