use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};

use pricefeed_market_data::PriceSource;

use crate::aggregation::PriceAggregator;
use crate::constants::{DEFAULT_TOP_ASSETS, DEFAULT_TOP_VENUES};
use crate::errors::Result;
use crate::snapshots::{Snapshot, SnapshotStore};
use crate::utils::now_millis;

/// How many ranked assets and venues a tick covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub top_assets: usize,
    pub top_venues: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_assets: DEFAULT_TOP_ASSETS,
            top_venues: DEFAULT_TOP_VENUES,
        }
    }
}

/// Result of one call to [`PricePipeline::run_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A snapshot was appended.
    Completed { timestamp: i64, assets: usize },
    /// Another tick was still running; nothing was done.
    Skipped,
    /// The tick aborted; nothing was appended.
    Failed(String),
}

const NO_TICK: i64 = i64::MIN;

/// Ties the price source, the aggregator and the store together.
///
/// At most one tick runs at a time. A tick that arrives while another is
/// running is dropped, never queued, so the store only ever sees one writer.
pub struct PricePipeline {
    source: Arc<dyn PriceSource>,
    aggregator: PriceAggregator,
    store: Arc<dyn SnapshotStore>,
    settings: PipelineSettings,
    is_running: AtomicBool,
    last_tick: AtomicI64,
}

/// Clears the running flag when the tick ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PricePipeline {
    pub fn new(
        source: Arc<dyn PriceSource>,
        store: Arc<dyn SnapshotStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            aggregator: PriceAggregator::new(source.clone()),
            source,
            store,
            settings,
            is_running: AtomicBool::new(false),
            last_tick: AtomicI64::new(NO_TICK),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Timestamp of the last snapshot this pipeline appended.
    pub fn last_tick(&self) -> Option<i64> {
        match self.last_tick.load(Ordering::SeqCst) {
            NO_TICK => None,
            ts => Some(ts),
        }
    }

    /// Run one tick unless one is already running.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`TickOutcome::Failed`], and the next tick is unaffected.
    pub async fn run_tick(&self) -> TickOutcome {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Previous pipeline tick still running, skipping this one");
            return TickOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.is_running);

        match self.execute().await {
            Ok(snapshot) => {
                self.last_tick.store(snapshot.timestamp, Ordering::SeqCst);
                info!(
                    "Data pipeline completed: {} assets at {}",
                    snapshot.len(),
                    snapshot.timestamp
                );
                TickOutcome::Completed {
                    timestamp: snapshot.timestamp,
                    assets: snapshot.len(),
                }
            }
            Err(e) => {
                error!("Error in data pipeline: {}", e);
                TickOutcome::Failed(e.to_string())
            }
        }
    }

    async fn execute(&self) -> Result<Snapshot> {
        let assets = self.source.top_assets(self.settings.top_assets).await?;
        let venues = self.source.top_venues(self.settings.top_venues).await?;
        debug!(
            "Ranked {} assets and {} venues from {}",
            assets.len(),
            venues.len(),
            self.source.id()
        );

        let aggregated = self.aggregator.aggregate(&assets, &venues).await;

        // One shared timestamp per tick, strictly after the previous one.
        let previous = match self.last_tick() {
            Some(prev) => Some(prev),
            None => self.store.newest_timestamp().await?,
        };
        let now = now_millis();
        let timestamp = match previous {
            Some(prev) if prev >= now => {
                warn!(
                    "Clock is behind the newest stored snapshot ({} >= {}), stamping {}",
                    prev,
                    now,
                    prev + 1
                );
                prev + 1
            }
            _ => now,
        };
        let snapshot = Snapshot::stamped(timestamp, aggregated.assets);

        self.store.append(&snapshot).await?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DatabaseError, Error};
    use crate::snapshots::{HistoricalPrices, LatestPrices, TimeRange};
    use async_trait::async_trait;
    use pricefeed_market_data::{MarketDataError, PriceVenue, TrackedAsset};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;
    use std::result::Result as StdResult;
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    // =========================================================================
    // Mocks
    // =========================================================================

    struct MockSource {
        fail_ranking: bool,
        /// When set, every price request waits for a permit.
        gate: Option<Arc<Semaphore>>,
    }

    impl MockSource {
        fn ok() -> Self {
            Self {
                fail_ranking: false,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl PriceSource for MockSource {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        async fn top_assets(&self, limit: usize) -> StdResult<Vec<TrackedAsset>, MarketDataError> {
            if self.fail_ranking {
                return Err(MarketDataError::UpstreamApi {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(vec![
                TrackedAsset::new("bitcoin", "btc", "Bitcoin"),
                TrackedAsset::new("ethereum", "eth", "Ethereum"),
            ]
            .into_iter()
            .take(limit)
            .collect())
        }

        async fn top_venues(&self, limit: usize) -> StdResult<Vec<PriceVenue>, MarketDataError> {
            Ok(vec![PriceVenue::new("binance", "Binance")]
                .into_iter()
                .take(limit)
                .collect())
        }

        async fn fetch_price(
            &self,
            asset: &TrackedAsset,
            _venue: &PriceVenue,
        ) -> StdResult<Decimal, MarketDataError> {
            let _permit = match &self.gate {
                Some(gate) => Some(gate.acquire().await.unwrap()),
                None => None,
            };
            match asset.id.as_str() {
                "bitcoin" => Ok(dec!(50000)),
                _ => Ok(dec!(3000)),
            }
        }
    }

    #[derive(Default)]
    struct MockSnapshotStore {
        appended: Mutex<Vec<Snapshot>>,
        fail_on_append: bool,
        /// Newest timestamp already in the log before the pipeline starts.
        stored_newest: Option<i64>,
    }

    #[async_trait]
    impl SnapshotStore for MockSnapshotStore {
        async fn append(&self, snapshot: &Snapshot) -> Result<()> {
            if self.fail_on_append {
                return Err(Error::Database(DatabaseError::QueryFailed(
                    "disk full".to_string(),
                )));
            }
            self.appended.lock().unwrap().push(snapshot.clone());
            Ok(())
        }

        async fn get_latest(&self, _symbols: &[String]) -> Result<LatestPrices> {
            Ok(LatestPrices::new())
        }

        async fn get_historical(
            &self,
            _symbols: &BTreeSet<String>,
            _range: TimeRange,
        ) -> Result<HistoricalPrices> {
            Ok(HistoricalPrices::new())
        }

        async fn newest_timestamp(&self) -> Result<Option<i64>> {
            let appended = self.appended.lock().unwrap();
            Ok(appended.last().map(|s| s.timestamp).or(self.stored_newest))
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn pipeline(source: MockSource, store: Arc<MockSnapshotStore>) -> PricePipeline {
        PricePipeline::new(Arc::new(source), store, PipelineSettings::default())
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_tick_appends_one_stamped_snapshot() {
        let store = Arc::new(MockSnapshotStore::default());
        let pipeline = pipeline(MockSource::ok(), store.clone());

        let outcome = pipeline.run_tick().await;

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        let snapshot = &appended[0];
        assert_eq!(
            outcome,
            TickOutcome::Completed {
                timestamp: snapshot.timestamp,
                assets: 2
            }
        );
        assert!(snapshot
            .assets
            .values()
            .all(|a| a.timestamp == snapshot.timestamp));
        assert_eq!(snapshot.assets["btc"].average_price, Some(dec!(50000)));
        assert_eq!(pipeline.last_tick(), Some(snapshot.timestamp));
        assert!(!pipeline.is_running());
    }

    #[tokio::test]
    async fn test_consecutive_ticks_have_increasing_timestamps() {
        let store = Arc::new(MockSnapshotStore::default());
        let pipeline = pipeline(MockSource::ok(), store.clone());

        pipeline.run_tick().await;
        pipeline.run_tick().await;
        pipeline.run_tick().await;

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 3);
        assert!(appended
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp));
    }

    #[tokio::test]
    async fn test_ranking_failure_aborts_tick() {
        let store = Arc::new(MockSnapshotStore::default());
        let source = MockSource {
            fail_ranking: true,
            gate: None,
        };
        let pipeline = pipeline(source, store.clone());

        let outcome = pipeline.run_tick().await;

        assert!(matches!(outcome, TickOutcome::Failed(_)));
        assert!(store.appended.lock().unwrap().is_empty());
        assert_eq!(pipeline.last_tick(), None);
        assert!(!pipeline.is_running());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_tick_and_next_tick_runs() {
        let store = Arc::new(MockSnapshotStore {
            fail_on_append: true,
            ..Default::default()
        });
        let pipeline = pipeline(MockSource::ok(), store);

        assert!(matches!(pipeline.run_tick().await, TickOutcome::Failed(_)));
        assert!(matches!(pipeline.run_tick().await, TickOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let gate = Arc::new(Semaphore::new(0));
        let store = Arc::new(MockSnapshotStore::default());
        let source = MockSource {
            fail_ranking: false,
            gate: Some(gate.clone()),
        };
        let pipeline = Arc::new(pipeline(source, store.clone()));

        let first = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.run_tick().await }
        });

        while !pipeline.is_running() {
            tokio::task::yield_now().await;
        }

        assert_eq!(pipeline.run_tick().await, TickOutcome::Skipped);
        assert!(store.appended.lock().unwrap().is_empty());

        // Permits return to the gate, so later ticks pass freely
        gate.add_permits(2);

        assert!(matches!(
            first.await.unwrap(),
            TickOutcome::Completed { assets: 2, .. }
        ));
        assert_eq!(store.appended.lock().unwrap().len(), 1);

        assert!(!pipeline.is_running());
        assert!(matches!(
            pipeline.run_tick().await,
            TickOutcome::Completed { .. }
        ));
        assert_eq!(store.appended.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_first_tick_stamps_after_newest_stored_snapshot() {
        let ahead = now_millis() + 3_600_000;
        let store = Arc::new(MockSnapshotStore {
            stored_newest: Some(ahead),
            ..Default::default()
        });
        let pipeline = pipeline(MockSource::ok(), store.clone());

        assert_eq!(
            pipeline.run_tick().await,
            TickOutcome::Completed {
                timestamp: ahead + 1,
                assets: 2
            }
        );
        assert!(matches!(
            pipeline.run_tick().await,
            TickOutcome::Completed { timestamp, .. } if timestamp == ahead + 2
        ));
    }
}
