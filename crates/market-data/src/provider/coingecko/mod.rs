//! CoinGecko price source implementation.
//!
//! Endpoints used:
//! - `coins/markets` for assets ranked by market cap
//! - `exchanges` for venues ranked by volume
//! - `simple/price` for the price of one asset on one exchange
//!
//! Every request waits on the shared rate limiter first. The demo tier
//! allows 30 calls per minute.
//! API documentation: https://docs.coingecko.com/reference/introduction

mod models;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::errors::MarketDataError;
use crate::models::{PriceVenue, TrackedAsset};
use crate::provider::PriceSource;
use crate::rate_limiter::RateLimiter;

use models::{CoinMarket, Exchange, SimplePriceResponse};

/// Default public API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3/";

const PROVIDER_ID: &str = "COINGECKO";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const VS_CURRENCY: &str = "usd";

/// CoinGecko price source.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
}

impl CoinGeckoProvider {
    /// Create a provider against the public API.
    pub fn new(api_key: String, rate_limiter: Arc<RateLimiter>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, rate_limiter)
    }

    /// Create a provider against a custom base URL (proxies, pro tier).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: String,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            client,
            base_url,
            api_key,
            rate_limiter,
        }
    }

    /// Make a rate-limited, authenticated GET request and decode the JSON body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        self.rate_limiter.wait().await;

        let url = format!("{}{}", self.base_url, endpoint);
        debug!("CoinGecko request: {} with {} params", endpoint, params.len());

        let response = self
            .client
            .get(&url)
            .query(params)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Error in API request to {}: {}", endpoint, e);
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::Network(e)
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Error in API request to {}: {} {}", endpoint, status, body);
            return Err(MarketDataError::UpstreamApi {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        decode(endpoint, &text)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Pull `body[asset_id][usd]` out of a `simple/price` response.
fn extract_price(
    response: &SimplePriceResponse,
    asset: &TrackedAsset,
    venue: &PriceVenue,
) -> Result<Decimal, MarketDataError> {
    let missing = || MarketDataError::MissingPrice {
        asset: asset.id.clone(),
        venue: venue.id.clone(),
    };

    let price = response
        .get(&asset.id)
        .and_then(|prices| prices.get(VS_CURRENCY))
        .copied()
        .ok_or_else(missing)?;

    match Decimal::try_from(price) {
        Ok(value) if value > Decimal::ZERO => Ok(value),
        _ => Err(missing()),
    }
}

#[async_trait]
impl PriceSource for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn top_assets(&self, limit: usize) -> Result<Vec<TrackedAsset>, MarketDataError> {
        let per_page = limit.to_string();
        let markets: Vec<CoinMarket> = self
            .fetch(
                "coins/markets",
                &[
                    ("vs_currency", VS_CURRENCY),
                    ("order", "market_cap_desc"),
                    ("per_page", per_page.as_str()),
                    ("page", "1"),
                    ("sparkline", "false"),
                ],
            )
            .await?;

        Ok(markets
            .into_iter()
            .map(|coin| TrackedAsset::new(coin.id, coin.symbol, coin.name))
            .collect())
    }

    async fn top_venues(&self, limit: usize) -> Result<Vec<PriceVenue>, MarketDataError> {
        let per_page = limit.to_string();
        let exchanges: Vec<Exchange> = self
            .fetch(
                "exchanges",
                &[
                    ("order", "volume_desc"),
                    ("per_page", per_page.as_str()),
                    ("page", "1"),
                ],
            )
            .await?;

        Ok(exchanges
            .into_iter()
            .map(|exchange| PriceVenue::new(exchange.id, exchange.name))
            .collect())
    }

    async fn fetch_price(
        &self,
        asset: &TrackedAsset,
        venue: &PriceVenue,
    ) -> Result<Decimal, MarketDataError> {
        let response: SimplePriceResponse = self
            .fetch(
                "simple/price",
                &[
                    ("ids", asset.id.as_str()),
                    ("vs_currencies", VS_CURRENCY),
                    ("exchange", venue.id.as_str()),
                ],
            )
            .await?;

        extract_price(&response, asset, venue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::RateLimitConfig;
    use rust_decimal_macros::dec;

    fn bitcoin() -> TrackedAsset {
        TrackedAsset::new("bitcoin", "btc", "Bitcoin")
    }

    fn binance() -> PriceVenue {
        PriceVenue::new("binance", "Binance")
    }

    #[test]
    fn test_extract_price() {
        let response: SimplePriceResponse =
            decode("simple/price", r#"{"bitcoin":{"usd":50123.5}}"#).unwrap();
        let price = extract_price(&response, &bitcoin(), &binance()).unwrap();
        assert_eq!(price, dec!(50123.5));
    }

    #[test]
    fn test_extract_price_missing_asset() {
        let response: SimplePriceResponse = decode("simple/price", "{}").unwrap();
        let err = extract_price(&response, &bitcoin(), &binance()).unwrap_err();
        assert!(matches!(err, MarketDataError::MissingPrice { .. }));
    }

    #[test]
    fn test_extract_price_rejects_non_positive() {
        let response: SimplePriceResponse =
            decode("simple/price", r#"{"bitcoin":{"usd":0}}"#).unwrap();
        let err = extract_price(&response, &bitcoin(), &binance()).unwrap_err();
        assert!(err.is_observation_level());
    }

    #[test]
    fn test_decode_rankings() {
        let markets: Vec<CoinMarket> = decode(
            "coins/markets",
            r#"[{"id":"bitcoin","symbol":"btc","name":"Bitcoin","current_price":50000}]"#,
        )
        .unwrap();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].symbol, "btc");

        let exchanges: Vec<Exchange> = decode(
            "exchanges",
            r#"[{"id":"binance","name":"Binance","trust_score":10}]"#,
        )
        .unwrap();
        assert_eq!(exchanges[0].name, "Binance");
    }

    #[test]
    fn test_decode_error_names_endpoint() {
        let err = decode::<Vec<Exchange>>("exchanges", "not json").unwrap_err();
        match err {
            MarketDataError::Decode { endpoint, .. } => assert_eq!(endpoint, "exchanges"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
        let provider =
            CoinGeckoProvider::with_base_url("http://localhost:9999/api", "key".into(), limiter);
        assert_eq!(provider.base_url, "http://localhost:9999/api/");
        assert_eq!(provider.id(), "COINGECKO");
    }
}
