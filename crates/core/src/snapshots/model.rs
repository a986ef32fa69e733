//! Domain models for price snapshots.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One price reported by one venue for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Display name of the venue that reported the price
    pub source: String,
    pub price: Decimal,
}

impl Observation {
    pub fn new(source: impl Into<String>, price: Decimal) -> Self {
        Self {
            source: source.into(),
            price,
        }
    }
}

/// Aggregated view of one asset for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub name: String,
    pub observations: Vec<Observation>,
    /// Mean of `observations`; `None` iff there are none.
    pub average_price: Option<Decimal>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl AssetSnapshot {
    /// Build a snapshot from the observations that succeeded.
    pub fn from_observations(
        name: impl Into<String>,
        observations: Vec<Observation>,
        timestamp: i64,
    ) -> Self {
        let average_price = mean_price(&observations);
        Self {
            name: name.into(),
            observations,
            average_price,
            timestamp,
        }
    }

    pub fn latest(&self) -> LatestPrice {
        LatestPrice {
            average_price: self.average_price,
            timestamp: self.timestamp,
        }
    }
}

fn mean_price(observations: &[Observation]) -> Option<Decimal> {
    if observations.is_empty() {
        return None;
    }
    let sum: Decimal = observations.iter().map(|o| o.price).sum();
    Some(sum / Decimal::from(observations.len()))
}

/// One tick's full symbol -> asset map. Every asset shares `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub timestamp: i64,
    pub assets: BTreeMap<String, AssetSnapshot>,
}

impl Snapshot {
    /// Stamp every asset with one shared tick timestamp.
    pub fn stamped(timestamp: i64, assets: BTreeMap<String, AssetSnapshot>) -> Self {
        let assets = assets
            .into_iter()
            .map(|(symbol, mut asset)| {
                asset.timestamp = timestamp;
                (symbol, asset)
            })
            .collect();
        Self { timestamp, assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Latest-index entry for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestPrice {
    pub average_price: Option<Decimal>,
    pub timestamp: i64,
}

/// One element of a symbol's historical series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPoint {
    pub timestamp: i64,
    pub average_price: Option<Decimal>,
    pub observations: Vec<Observation>,
}

impl HistoricalPoint {
    pub fn from_asset(timestamp: i64, asset: &AssetSnapshot) -> Self {
        Self {
            timestamp,
            average_price: asset.average_price,
            observations: asset.observations.clone(),
        }
    }
}

/// Symbol -> latest entry. Symbols without data are absent.
pub type LatestPrices = BTreeMap<String, LatestPrice>;

/// Symbol -> points in ascending timestamp order.
pub type HistoricalPrices = BTreeMap<String, Vec<HistoricalPoint>>;

/// Inclusive range of epoch-millisecond timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    /// Negative `from` is clamped to zero.
    pub fn new(from: i64, to: i64) -> Self {
        Self {
            from: from.max(0),
            to,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.from <= timestamp && timestamp <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_average_is_mean_of_observations() {
        let asset = AssetSnapshot::from_observations(
            "Bitcoin",
            vec![
                Observation::new("Binance", dec!(50000)),
                Observation::new("Coinbase", dec!(50100)),
                Observation::new("Kraken", dec!(50200)),
            ],
            1_000,
        );
        assert_eq!(asset.average_price, Some(dec!(50100)));
    }

    #[test]
    fn test_no_observations_means_no_average() {
        let asset = AssetSnapshot::from_observations("Bitcoin", vec![], 1_000);
        assert_eq!(asset.average_price, None);
        assert_eq!(asset.latest().timestamp, 1_000);
    }

    #[test]
    fn test_stamped_overrides_asset_timestamps() {
        let mut assets = BTreeMap::new();
        assets.insert(
            "btc".to_string(),
            AssetSnapshot::from_observations("Bitcoin", vec![], 10),
        );
        assets.insert(
            "eth".to_string(),
            AssetSnapshot::from_observations("Ethereum", vec![], 12),
        );

        let snapshot = Snapshot::stamped(99, assets);
        assert!(snapshot.assets.values().all(|a| a.timestamp == 99));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_asset_snapshot_wire_shape() {
        let asset = AssetSnapshot::from_observations(
            "Bitcoin",
            vec![Observation::new("Binance", dec!(50000))],
            1_000,
        );
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["averagePrice"], serde_json::json!(50000.0));
        assert_eq!(json["observations"][0]["source"], "Binance");

        let empty = AssetSnapshot::from_observations("Bitcoin", vec![], 1_000);
        let json = serde_json::to_value(&empty).unwrap();
        assert!(json["averagePrice"].is_null());
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::new(-5, 2_000);
        assert_eq!(range.from, 0);
        assert!(range.contains(0));
        assert!(range.contains(2_000));
        assert!(!range.contains(2_001));
        assert!(TimeRange::new(10, 5).is_empty());
    }
}
