use diesel::prelude::*;
use pricefeed_core::snapshots::{AssetSnapshot, LatestPrice, Observation};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Database row of the `entries` table.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntryDB {
    pub entry_key: String,
    pub payload: String,
}

impl EntryDB {
    pub fn new(entry_key: String, payload: String) -> Self {
        Self { entry_key, payload }
    }
}

// Stored payloads keep decimals as strings so reads return exactly what was
// appended; the wire types encode them as JSON numbers.

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPayload {
    pub source: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssetPayload {
    pub name: String,
    pub observations: Vec<ObservationPayload>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub average_price: Option<Decimal>,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LatestPayload {
    #[serde(with = "rust_decimal::serde::str_option")]
    pub average_price: Option<Decimal>,
    pub timestamp: i64,
}

impl From<&Observation> for ObservationPayload {
    fn from(observation: &Observation) -> Self {
        Self {
            source: observation.source.clone(),
            price: observation.price,
        }
    }
}

impl From<ObservationPayload> for Observation {
    fn from(payload: ObservationPayload) -> Self {
        Observation::new(payload.source, payload.price)
    }
}

impl From<&AssetSnapshot> for AssetPayload {
    fn from(asset: &AssetSnapshot) -> Self {
        Self {
            name: asset.name.clone(),
            observations: asset.observations.iter().map(Into::into).collect(),
            average_price: asset.average_price,
            timestamp: asset.timestamp,
        }
    }
}

impl From<AssetPayload> for AssetSnapshot {
    fn from(payload: AssetPayload) -> Self {
        Self {
            name: payload.name,
            observations: payload.observations.into_iter().map(Into::into).collect(),
            average_price: payload.average_price,
            timestamp: payload.timestamp,
        }
    }
}

impl From<LatestPrice> for LatestPayload {
    fn from(latest: LatestPrice) -> Self {
        Self {
            average_price: latest.average_price,
            timestamp: latest.timestamp,
        }
    }
}

impl From<LatestPayload> for LatestPrice {
    fn from(payload: LatestPayload) -> Self {
        Self {
            average_price: payload.average_price,
            timestamp: payload.timestamp,
        }
    }
}
