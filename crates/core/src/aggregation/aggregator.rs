use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;

use pricefeed_market_data::{MarketDataError, PriceSource, PriceVenue, TrackedAsset};

use crate::snapshots::{AssetSnapshot, Observation, Snapshot};
use crate::utils::now_millis;

/// Concurrent price collection and per-asset reduction.
///
/// Requests are gated by the rate limiter inside the [`PriceSource`]; the
/// aggregator issues them all at once and lets the limiter pace them.
#[derive(Clone)]
pub struct PriceAggregator {
    source: Arc<dyn PriceSource>,
}

impl PriceAggregator {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// Collect prices for every asset from every venue.
    ///
    /// Failed observations are logged and dropped. Every requested asset is
    /// present in the result, with no average when none of its venues
    /// answered. Each asset carries the time its own join completed; the
    /// snapshot carries the time the last one did.
    pub async fn aggregate(&self, assets: &[TrackedAsset], venues: &[PriceVenue]) -> Snapshot {
        let per_asset = assets.iter().map(|asset| self.aggregate_asset(asset, venues));
        let results = join_all(per_asset).await;

        let mut snapshot_assets = BTreeMap::new();
        for (asset, snapshot) in assets.iter().zip(results) {
            if snapshot_assets
                .insert(asset.symbol.clone(), snapshot)
                .is_some()
            {
                warn!(
                    "Duplicate symbol '{}' in ranked assets, keeping {}",
                    asset.symbol, asset.id
                );
            }
        }

        Snapshot {
            timestamp: now_millis(),
            assets: snapshot_assets,
        }
    }

    async fn aggregate_asset(&self, asset: &TrackedAsset, venues: &[PriceVenue]) -> AssetSnapshot {
        let requests = venues.iter().map(|venue| async move {
            let result = self.source.fetch_price(asset, venue).await;
            (venue, result)
        });
        let settled: Vec<(&PriceVenue, Result<Decimal, MarketDataError>)> =
            join_all(requests).await;

        let observations: Vec<Observation> = settled
            .into_iter()
            .filter_map(|(venue, result)| match result {
                Ok(price) => Some(Observation::new(venue.name.clone(), price)),
                Err(e) => {
                    warn!(
                        "Error fetching price for {} on {}: {}",
                        asset.name, venue.name, e
                    );
                    None
                }
            })
            .collect();

        debug!(
            "{}: {} of {} venues answered",
            asset.symbol,
            observations.len(),
            venues.len()
        );

        AssetSnapshot::from_observations(asset.name.clone(), observations, now_millis())
    }
}
