use serde::{Deserialize, Serialize};

/// A price source ranked by the upstream provider, e.g. the top exchanges by volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVenue {
    /// Upstream identifier passed to price lookups (e.g. "binance").
    pub id: String,
    /// Display name recorded on each observation (e.g. "Binance").
    pub name: String,
}

impl PriceVenue {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
