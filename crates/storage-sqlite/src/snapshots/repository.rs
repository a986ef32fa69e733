use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::keys::{latest_key, parse_snapshot_key, snapshot_key, snapshot_key_bounds};
use super::model::{AssetPayload, EntryDB, LatestPayload};
use crate::db::{self, get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::entries::dsl as entries_dsl;
use pricefeed_core::errors::{DatabaseError, Error};
use pricefeed_core::snapshots::{
    AssetSnapshot, HistoricalPoint, HistoricalPrices, LatestPrice, LatestPrices, Snapshot,
    SnapshotStore, TimeRange,
};
use pricefeed_core::Result;

#[derive(Clone)]
struct Handles {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

/// SQLite-backed [`SnapshotStore`].
///
/// Appends go through the single-writer actor, one immediate transaction
/// each; reads use pooled connections. Under WAL a reader sees an append
/// completely or not at all.
pub struct SqliteSnapshotStore {
    db_path: String,
    handles: RwLock<Option<Handles>>,
}

impl SqliteSnapshotStore {
    /// Open (creating if needed) the store at `db_path` and apply migrations.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(db_path: &str) -> Result<Self> {
        db::init(db_path)?;
        let pool = db::create_pool(db_path)?;
        db::run_migrations(&pool)?;
        let writer = db::spawn_writer(&pool)?;

        info!("Snapshot store opened at {}", db_path);

        Ok(Self {
            db_path: db_path.to_string(),
            handles: RwLock::new(Some(Handles { pool, writer })),
        })
    }

    async fn handles(&self) -> Result<Handles> {
        self.handles
            .read()
            .await
            .clone()
            .ok_or(Error::Database(DatabaseError::Closed))
    }
}

// =============================================================================
// Write path
// =============================================================================

fn newest_snapshot_timestamp(conn: &mut SqliteConnection) -> Result<Option<i64>> {
    let (lo, hi) = snapshot_key_bounds();
    let newest: Option<String> = entries_dsl::entries
        .select(entries_dsl::entry_key)
        .filter(entries_dsl::entry_key.between(lo, hi))
        .order(entries_dsl::entry_key.desc())
        .first::<String>(conn)
        .optional()
        .into_core()?;
    Ok(newest.as_deref().and_then(parse_snapshot_key))
}

fn stored_assets(assets: &BTreeMap<String, AssetSnapshot>) -> BTreeMap<&str, AssetPayload> {
    assets
        .iter()
        .map(|(symbol, asset)| (symbol.as_str(), AssetPayload::from(asset)))
        .collect()
}

/// Rows for one append: the log entry first, then one index entry per symbol.
fn append_rows(snapshot: &Snapshot) -> Result<(EntryDB, Vec<EntryDB>)> {
    let log_row = EntryDB::new(
        snapshot_key(snapshot.timestamp),
        serde_json::to_string(&stored_assets(&snapshot.assets)).into_core()?,
    );

    let index_rows = snapshot
        .assets
        .iter()
        .map(|(symbol, asset)| -> Result<EntryDB> {
            let latest = LatestPayload::from(LatestPrice {
                average_price: asset.average_price,
                timestamp: snapshot.timestamp,
            });
            Ok(EntryDB::new(
                latest_key(symbol),
                serde_json::to_string(&latest).into_core()?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((log_row, index_rows))
}

// =============================================================================
// SnapshotStore Implementation
// =============================================================================

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn append(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.timestamp < 0 {
            return Err(Error::Validation(format!(
                "snapshot timestamp {} is negative",
                snapshot.timestamp
            )));
        }

        let timestamp = snapshot.timestamp;
        let (log_row, index_rows) = append_rows(snapshot)?;
        let handles = self.handles().await?;

        handles
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                if let Some(newest) = newest_snapshot_timestamp(conn)? {
                    if timestamp <= newest {
                        return Err(Error::Validation(format!(
                            "snapshot timestamp {} is not after the newest stored snapshot {}",
                            timestamp, newest
                        )));
                    }
                }

                diesel::insert_into(entries_dsl::entries)
                    .values(&log_row)
                    .execute(conn)
                    .into_core()?;

                if !index_rows.is_empty() {
                    diesel::replace_into(entries_dsl::entries)
                        .values(&index_rows)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(())
            })
            .await?;

        debug!(
            "Appended snapshot {} with {} assets",
            timestamp,
            snapshot.len()
        );
        Ok(())
    }

    async fn get_latest(&self, symbols: &[String]) -> Result<LatestPrices> {
        let handles = self.handles().await?;
        if symbols.is_empty() {
            return Ok(LatestPrices::new());
        }

        let wanted: Vec<String> = symbols.iter().map(|s| latest_key(s)).collect();
        let mut conn = get_connection(&handles.pool)?;
        let rows: Vec<EntryDB> = entries_dsl::entries
            .filter(entries_dsl::entry_key.eq_any(wanted.clone()))
            .select(EntryDB::as_select())
            .load(&mut conn)
            .into_core()?;

        let by_key: HashMap<String, LatestPrice> = rows
            .into_iter()
            .map(|row| -> Result<(String, LatestPrice)> {
                let latest: LatestPayload = serde_json::from_str(&row.payload).into_core()?;
                Ok((row.entry_key, latest.into()))
            })
            .collect::<Result<_>>()?;

        Ok(symbols
            .iter()
            .zip(wanted.iter())
            .filter_map(|(symbol, key)| by_key.get(key).map(|v| (symbol.clone(), v.clone())))
            .collect())
    }

    async fn get_historical(
        &self,
        symbols: &BTreeSet<String>,
        range: TimeRange,
    ) -> Result<HistoricalPrices> {
        let handles = self.handles().await?;
        let mut historical = HistoricalPrices::new();
        if range.is_empty() {
            return Ok(historical);
        }

        let wanted: BTreeSet<String> = symbols.iter().map(|s| s.to_lowercase()).collect();
        let mut conn = get_connection(&handles.pool)?;

        // Known limitation: linear in the number of snapshots inside the range.
        let rows: Vec<EntryDB> = entries_dsl::entries
            .filter(
                entries_dsl::entry_key.between(snapshot_key(range.from), snapshot_key(range.to)),
            )
            .order(entries_dsl::entry_key.asc())
            .select(EntryDB::as_select())
            .load(&mut conn)
            .into_core()?;

        for row in rows {
            let Some(timestamp) = parse_snapshot_key(&row.entry_key) else {
                continue;
            };
            let assets: BTreeMap<String, AssetPayload> =
                serde_json::from_str(&row.payload).into_core()?;

            for (symbol, payload) in assets {
                if wanted.is_empty() || wanted.contains(&symbol.to_lowercase()) {
                    let asset = AssetSnapshot::from(payload);
                    historical
                        .entry(symbol)
                        .or_default()
                        .push(HistoricalPoint::from_asset(timestamp, &asset));
                }
            }
        }

        Ok(historical)
    }

    async fn newest_timestamp(&self) -> Result<Option<i64>> {
        let handles = self.handles().await?;
        let mut conn = get_connection(&handles.pool)?;
        newest_snapshot_timestamp(&mut conn)
    }

    async fn close(&self) -> Result<()> {
        if self.handles.write().await.take().is_some() {
            info!("Snapshot store at {} closed", self.db_path);
        }
        Ok(())
    }
}
