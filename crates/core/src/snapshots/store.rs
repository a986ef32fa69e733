//! Snapshot storage trait.
//!
//! The store is an append-only log of [`Snapshot`]s plus a derived
//! latest-value index. Implementations keep the log ordered by timestamp so
//! that range reads are a contiguous scan.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::model::{HistoricalPrices, LatestPrices, Snapshot, TimeRange};
use crate::errors::Result;

/// Storage interface for price snapshots.
///
/// One logical writer (the pipeline) and many concurrent readers (the query
/// service). A reader never observes a snapshot in the log without its
/// index entries, or index entries without their snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Appends a snapshot to the log, then overwrites the latest-index entry
    /// of every symbol it contains.
    ///
    /// Fails with a validation error when `snapshot.timestamp` is negative or
    /// not strictly greater than the newest stored snapshot.
    async fn append(&self, snapshot: &Snapshot) -> Result<()>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Point lookup in the latest index.
    ///
    /// Results are keyed by the symbol exactly as requested; lookup is
    /// case-insensitive. Symbols never written are absent from the map.
    async fn get_latest(&self, symbols: &[String]) -> Result<LatestPrices>;

    /// Range read over the log, inclusive on both ends.
    ///
    /// An empty `symbols` set means every symbol. Matching is
    /// case-insensitive and results are keyed by the stored symbol, each
    /// series in ascending timestamp order.
    async fn get_historical(
        &self,
        symbols: &BTreeSet<String>,
        range: TimeRange,
    ) -> Result<HistoricalPrices>;

    /// Timestamp of the newest snapshot in the log, if any.
    async fn newest_timestamp(&self) -> Result<Option<i64>>;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Releases the underlying resources. Later calls on the store fail with
    /// `DatabaseError::Closed`; closing twice is a no-op.
    async fn close(&self) -> Result<()>;
}
