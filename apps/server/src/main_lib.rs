use std::sync::Arc;

use crate::{config::Config, identity::load_or_create_peer_id};
use pricefeed_core::{PipelineSettings, PricePipeline, SnapshotStore};
use pricefeed_market_data::{CoinGeckoProvider, PriceSource, RateLimitConfig, RateLimiter};
use pricefeed_rpc::{PeerId, QueryService};
use pricefeed_storage_sqlite::SqliteSnapshotStore;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub peer_id: PeerId,
    pub store: Arc<SqliteSnapshotStore>,
    pub pipeline: Arc<PricePipeline>,
    pub query_service: Arc<QueryService>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("PF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = Arc::new(SqliteSnapshotStore::open(&config.db_path)?);
    let store_dyn: Arc<dyn SnapshotStore> = store.clone();

    let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::per_minute(
        config.requests_per_minute,
    )));
    let source: Arc<dyn PriceSource> = Arc::new(CoinGeckoProvider::with_base_url(
        config.api_base_url.clone(),
        config.api_key.clone(),
        rate_limiter,
    ));

    let pipeline = Arc::new(PricePipeline::new(
        source,
        store_dyn.clone(),
        PipelineSettings {
            top_assets: config.top_assets,
            top_venues: config.top_venues,
        },
    ));
    let query_service = Arc::new(QueryService::new(store_dyn));

    let peer_id = load_or_create_peer_id(&config.peer_key_file)?;
    tracing::info!("Server public key: {}", peer_id);

    Ok(Arc::new(AppState {
        peer_id,
        store,
        pipeline,
        query_service,
        db_path: config.db_path.clone(),
    }))
}
