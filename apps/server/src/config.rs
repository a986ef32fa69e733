use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context};
use pricefeed_core::constants::{DEFAULT_FETCH_INTERVAL_SECS, DEFAULT_TOP_ASSETS, DEFAULT_TOP_VENUES};
use pricefeed_market_data::provider::coingecko::DEFAULT_BASE_URL;
use pricefeed_market_data::rate_limiter::DEFAULT_REQUESTS_PER_MINUTE;

pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub fetch_interval: Duration,
    pub requests_per_minute: u32,
    pub top_assets: usize,
    pub top_venues: usize,
    pub db_path: String,
    pub listen_addr: SocketAddr,
    pub peer_key_file: PathBuf,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("PF_API_KEY")
            .or_else(|_| std::env::var("COINGECKO_API_KEY"))
            .map_err(|_| anyhow!("CoinGecko API key is required. Set PF_API_KEY in .env"))?;
        let api_base_url =
            std::env::var("PF_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let listen_addr: SocketAddr = std::env::var("PF_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:40001".to_string())
            .parse()
            .context("Invalid PF_LISTEN_ADDR")?;
        let db_path = std::env::var("PF_DB_PATH").unwrap_or_else(|_| "./db/pricefeed.db".into());
        let peer_key_file = std::env::var("PF_PEER_KEY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_peer_key_file(&db_path));

        Ok(Self {
            api_key,
            api_base_url,
            fetch_interval: Duration::from_secs(
                env_or("PF_FETCH_INTERVAL_SECS", DEFAULT_FETCH_INTERVAL_SECS).max(1),
            ),
            requests_per_minute: env_or("PF_REQUESTS_PER_MINUTE", DEFAULT_REQUESTS_PER_MINUTE),
            top_assets: env_or("PF_TOP_ASSETS", DEFAULT_TOP_ASSETS),
            top_venues: env_or("PF_TOP_SOURCES", DEFAULT_TOP_VENUES),
            db_path,
            listen_addr,
            peer_key_file,
        })
    }
}

/// `peer.key` next to the database file.
pub fn default_peer_key_file(db_path: &str) -> PathBuf {
    PathBuf::from(db_path)
        .parent()
        .map(|dir| dir.join("peer.key"))
        .unwrap_or_else(|| PathBuf::from("peer.key"))
}
