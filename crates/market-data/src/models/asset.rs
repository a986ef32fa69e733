use serde::{Deserialize, Serialize};

/// An asset ranked by the upstream source, e.g. the top coins by market cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAsset {
    /// Upstream identifier used in price lookups (e.g. "bitcoin").
    pub id: String,
    /// Ticker symbol, the key under which snapshots are stored (e.g. "btc").
    pub symbol: String,
    /// Display name (e.g. "Bitcoin").
    pub name: String,
}

impl TrackedAsset {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}
