//! Transports that carry query payloads between peers.
//!
//! - [`LoopbackTransport`] - in-process registry of handlers
//! - [`HttpTransport`] - `POST {base}/rpc/{peer}/{method}`

mod http;
mod loopback;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::errors::TransportError;
use crate::peer::PeerId;

pub use http::HttpTransport;
pub use loopback::LoopbackTransport;

/// Per-call context the transport can observe.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    /// Past this instant the caller no longer wants the reply.
    pub deadline: Instant,
}

impl CallContext {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline }
    }

    pub fn remaining(&self) -> std::time::Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Delivers one request payload to a peer and returns its reply payload.
///
/// Dropping the returned future abandons the call; implementations must not
/// deliver a late reply anywhere after that.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        peer: &PeerId,
        method: &str,
        payload: Vec<u8>,
        ctx: CallContext,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Server side of a transport: turns a request payload into a reply payload.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, method: &str, payload: &[u8]) -> Vec<u8>;
}
