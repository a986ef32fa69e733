//! CoinGecko API response models.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! payloads is ignored.

use std::collections::HashMap;

use serde::Deserialize;

/// Entry of the `coins/markets` response.
#[derive(Debug, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// Entry of the `exchanges` response.
#[derive(Debug, Deserialize)]
pub struct Exchange {
    pub id: String,
    pub name: String,
}

/// `simple/price` response: asset id -> vs-currency -> price.
///
/// Prices are kept as `f64` here; CoinGecko sends plain JSON numbers and the
/// conversion to `Decimal` happens after validation.
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;
