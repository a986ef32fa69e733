use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use pricefeed_core::snapshots::SnapshotStore;
use pricefeed_core::utils::now_millis;
use pricefeed_core::Error;

use crate::protocol::{
    ErrorKind, ErrorPayload, HistoricalPricesRequest, LatestPricesRequest, Method,
};
use crate::transport::RequestHandler;

/// Server side of the query protocol, reading from a [`SnapshotStore`].
///
/// Every request gets a reply payload: malformed requests, unknown methods
/// and storage faults come back as an [`ErrorPayload`].
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn SnapshotStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Answer one request. Never fails.
    pub async fn respond(&self, method: &str, payload: &[u8]) -> Vec<u8> {
        match self.dispatch(method, payload).await {
            Ok(body) => body,
            Err(err) => {
                warn!("{} failed ({}): {}", method, err.kind, err.error);
                encode(&err).unwrap_or_else(|_| fallback_error())
            }
        }
    }

    async fn dispatch(&self, method: &str, payload: &[u8]) -> Result<Vec<u8>, ErrorPayload> {
        let method: Method = method
            .parse()
            .map_err(|e: String| ErrorPayload::new(ErrorKind::UnknownMethod, e))?;

        match method {
            Method::GetLatestPrices => {
                let request: LatestPricesRequest = decode(payload)?;
                debug!("getLatestPrices for {:?}", request.pairs);
                let prices = self
                    .store
                    .get_latest(&request.pairs)
                    .await
                    .map_err(from_core)?;
                encode(&prices)
            }
            Method::GetHistoricalPrices => {
                let request: HistoricalPricesRequest = decode(payload)?;
                let range = request.range(now_millis());
                debug!(
                    "getHistoricalPrices for {:?} in [{}, {}]",
                    request.pairs, range.from, range.to
                );
                let prices = self
                    .store
                    .get_historical(&request.symbols(), range)
                    .await
                    .map_err(from_core)?;
                encode(&prices)
            }
        }
    }
}

#[async_trait]
impl RequestHandler for QueryService {
    async fn handle(&self, method: &str, payload: &[u8]) -> Vec<u8> {
        self.respond(method, payload).await
    }
}

/// An empty body stands for a request with every field defaulted.
fn decode<T: DeserializeOwned + Default>(payload: &[u8]) -> Result<T, ErrorPayload> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(payload)
        .map_err(|e| ErrorPayload::new(ErrorKind::BadRequest, format!("Invalid request: {}", e)))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ErrorPayload> {
    serde_json::to_vec(value).map_err(|e| {
        error!("Failed to encode response: {}", e);
        ErrorPayload::new(ErrorKind::Internal, e.to_string())
    })
}

fn from_core(err: Error) -> ErrorPayload {
    let kind = match err {
        Error::Database(_) | Error::Serialization(_) => ErrorKind::Storage,
        Error::Validation(_) => ErrorKind::BadRequest,
        _ => ErrorKind::Internal,
    };
    ErrorPayload::new(kind, err.to_string())
}

fn fallback_error() -> Vec<u8> {
    br#"{"error":"internal error","kind":"internal"}"#.to_vec()
}
