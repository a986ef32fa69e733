use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use super::{CallContext, RequestHandler, Transport};
use crate::errors::TransportError;
use crate::peer::PeerId;

/// In-process transport: requests go straight to the handler registered
/// under the addressed peer.
#[derive(Default, Clone)]
pub struct LoopbackTransport {
    handlers: Arc<RwLock<HashMap<PeerId, Arc<dyn RequestHandler>>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, peer: PeerId, handler: Arc<dyn RequestHandler>) {
        debug!("Loopback: registered handler for {}", peer);
        self.handlers.write().await.insert(peer, handler);
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn request(
        &self,
        peer: &PeerId,
        method: &str,
        payload: Vec<u8>,
        ctx: CallContext,
    ) -> Result<Vec<u8>, TransportError> {
        let handler = self
            .handlers
            .read()
            .await
            .get(peer)
            .cloned()
            .ok_or(TransportError::UnknownPeer(*peer))?;

        tokio::time::timeout_at(ctx.deadline, handler.handle(method, &payload))
            .await
            .map_err(|_| TransportError::DeadlineExceeded)
    }
}
