use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use pricefeed_core::snapshots::{HistoricalPrices, LatestPrices};

use crate::errors::{QueryError, TransportError};
use crate::peer::PeerId;
use crate::protocol::{HistoricalPricesRequest, LatestPricesRequest, Method, WireResponse};
use crate::transport::{CallContext, Transport};

/// Hard bound on every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Client side of the query protocol.
///
/// Every call either yields the server's result or a [`QueryError`]; none
/// outlives its deadline. When the deadline passes the in-flight request
/// future is dropped, which abandons it at the transport. There is no retry.
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    server: PeerId,
    timeout: Duration,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>, server: PeerId) -> Self {
        Self {
            transport,
            server,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server(&self) -> &PeerId {
        &self.server
    }

    pub async fn get_latest_prices(&self, pairs: Vec<String>) -> Result<LatestPrices, QueryError> {
        self.call(Method::GetLatestPrices, &LatestPricesRequest { pairs })
            .await
    }

    /// `to` defaults to the server's clock when omitted.
    pub async fn get_historical_prices(
        &self,
        pairs: Vec<String>,
        from: i64,
        to: Option<i64>,
    ) -> Result<HistoricalPrices, QueryError> {
        self.call(
            Method::GetHistoricalPrices,
            &HistoricalPricesRequest { pairs, from, to },
        )
        .await
    }

    async fn call<Req, Resp>(&self, method: Method, request: &Req) -> Result<Resp, QueryError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload =
            serde_json::to_vec(request).map_err(|e| QueryError::Encode(e.to_string()))?;

        let ctx = CallContext::with_deadline(Instant::now() + self.timeout);
        debug!("{} -> {}", method, self.server);

        let reply = tokio::time::timeout_at(
            ctx.deadline,
            self.transport
                .request(&self.server, method.as_str(), payload, ctx),
        )
        .await;

        let bytes = match reply {
            Err(_) => {
                warn!("{} to {} timed out", method, self.server);
                return Err(self.timeout_error(method));
            }
            Ok(Err(TransportError::DeadlineExceeded)) => {
                warn!("{} to {} timed out in transport", method, self.server);
                return Err(self.timeout_error(method));
            }
            Ok(Err(e)) => {
                warn!("{} to {} failed: {}", method, self.server, e);
                return Err(e.into());
            }
            Ok(Ok(bytes)) => bytes,
        };

        match serde_json::from_slice::<WireResponse<Resp>>(&bytes) {
            Ok(WireResponse::Ok(value)) => Ok(value),
            Ok(WireResponse::Error(payload)) => Err(QueryError::Remote {
                kind: payload.kind,
                message: payload.error,
            }),
            Err(e) => Err(QueryError::Decode(e.to_string())),
        }
    }

    fn timeout_error(&self, method: Method) -> QueryError {
        QueryError::Timeout {
            method: method.as_str().to_string(),
            after: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorKind;
    use crate::service::QueryService;
    use crate::transport::{LoopbackTransport, RequestHandler};
    use async_trait::async_trait;
    use pricefeed_core::errors::Result as CoreResult;
    use pricefeed_core::snapshots::{
        AssetSnapshot, Observation, Snapshot, SnapshotStore, TimeRange,
    };
    use rust_decimal_macros::dec;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    /// Handler that never answers; records when its future is dropped.
    struct HangingHandler {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RequestHandler for HangingHandler {
        async fn handle(&self, _method: &str, _payload: &[u8]) -> Vec<u8> {
            let _flag = DropFlag(self.dropped.clone());
            std::future::pending::<Vec<u8>>().await
        }
    }

    /// Handler replying with a fixed body.
    struct FixedHandler(&'static [u8]);

    #[async_trait]
    impl RequestHandler for FixedHandler {
        async fn handle(&self, _method: &str, _payload: &[u8]) -> Vec<u8> {
            self.0.to_vec()
        }
    }

    /// Transport that fails at the transport level.
    struct BrokenTransport;

    #[async_trait]
    impl Transport for BrokenTransport {
        async fn request(
            &self,
            _peer: &PeerId,
            _method: &str,
            _payload: Vec<u8>,
            _ctx: CallContext,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            Err(TransportError::Status {
                status: 404,
                body: "unknown peer".to_string(),
            })
        }
    }

    /// In-memory store holding appended snapshots.
    #[derive(Default)]
    struct MemoryStore {
        snapshots: Mutex<Vec<Snapshot>>,
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn append(&self, snapshot: &Snapshot) -> CoreResult<()> {
            self.snapshots.lock().await.push(snapshot.clone());
            Ok(())
        }

        async fn get_latest(&self, symbols: &[String]) -> CoreResult<LatestPrices> {
            let snapshots = self.snapshots.lock().await;
            let mut latest = LatestPrices::new();
            for symbol in symbols {
                for snapshot in snapshots.iter() {
                    if let Some(asset) = snapshot.assets.get(&symbol.to_lowercase()) {
                        latest.insert(symbol.clone(), asset.latest());
                    }
                }
            }
            Ok(latest)
        }

        async fn get_historical(
            &self,
            _symbols: &BTreeSet<String>,
            _range: TimeRange,
        ) -> CoreResult<HistoricalPrices> {
            Ok(HistoricalPrices::new())
        }

        async fn newest_timestamp(&self) -> CoreResult<Option<i64>> {
            Ok(self.snapshots.lock().await.last().map(|s| s.timestamp))
        }

        async fn close(&self) -> CoreResult<()> {
            Ok(())
        }
    }

    async fn loopback_with(handler: Arc<dyn RequestHandler>) -> (Arc<LoopbackTransport>, PeerId) {
        let transport = Arc::new(LoopbackTransport::new());
        let peer = PeerId::random();
        transport.register(peer, handler).await;
        (transport, peer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_server_times_out_within_bound() {
        let dropped = Arc::new(AtomicBool::new(false));
        let (transport, peer) = loopback_with(Arc::new(HangingHandler {
            dropped: dropped.clone(),
        }))
        .await;
        let client = QueryClient::new(transport, peer);

        let start = Instant::now();
        let err = client
            .get_latest_prices(vec!["btc".to_string()])
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_timeout(), "{err}");
        assert!(elapsed >= DEFAULT_TIMEOUT);
        assert!(elapsed < DEFAULT_TIMEOUT + Duration::from_millis(50));
        // The abandoned handler future was dropped, not left running
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_round_trip_through_loopback() {
        let store = Arc::new(MemoryStore::default());
        let mut assets = BTreeMap::new();
        assets.insert(
            "btc".to_string(),
            AssetSnapshot::from_observations(
                "Bitcoin",
                vec![Observation::new("Binance", dec!(51000))],
                0,
            ),
        );
        store.append(&Snapshot::stamped(2000, assets)).await.unwrap();

        let (transport, peer) = loopback_with(Arc::new(QueryService::new(store))).await;
        let client = QueryClient::new(transport, peer);

        let latest = client
            .get_latest_prices(vec!["BTC".to_string(), "eth".to_string()])
            .await
            .unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["BTC"].average_price, Some(dec!(51000)));
        assert_eq!(latest["BTC"].timestamp, 2000);
    }

    #[tokio::test]
    async fn test_error_payload_becomes_remote_error() {
        let (transport, peer) = loopback_with(Arc::new(FixedHandler(
            br#"{"error":"Store is closed","kind":"storage"}"#,
        )))
        .await;
        let client = QueryClient::new(transport, peer);

        let err = client.get_latest_prices(vec![]).await.unwrap_err();
        assert!(matches!(
            err,
            QueryError::Remote { kind: ErrorKind::Storage, .. }
        ));
    }

    #[tokio::test]
    async fn test_garbage_reply_becomes_decode_error() {
        let (transport, peer) = loopback_with(Arc::new(FixedHandler(b"<html>"))).await;
        let client = QueryClient::new(transport, peer);

        let err = client
            .get_historical_prices(vec![], 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_failures_become_transport_errors() {
        let client = QueryClient::new(Arc::new(BrokenTransport), PeerId::random());
        let err = client.get_latest_prices(vec![]).await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));

        let unregistered = QueryClient::new(Arc::new(LoopbackTransport::new()), PeerId::random());
        let err = unregistered.get_latest_prices(vec![]).await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(msg) if msg.contains("Unknown peer")));
    }
}
