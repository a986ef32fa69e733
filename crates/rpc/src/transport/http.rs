use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::{CallContext, Transport};
use crate::errors::TransportError;
use crate::peer::PeerId;

/// HTTP transport: `POST {base_url}/rpc/{peer hex}/{method}` with the JSON
/// request as the body; the reply body is the JSON response.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, peer: &PeerId, method: &str) -> String {
        format!("{}/rpc/{}/{}", self.base_url, peer.to_hex(), method)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        peer: &PeerId,
        method: &str,
        payload: Vec<u8>,
        ctx: CallContext,
    ) -> Result<Vec<u8>, TransportError> {
        let remaining = ctx.remaining();
        if remaining.is_zero() {
            return Err(TransportError::DeadlineExceeded);
        }

        let url = self.url(peer, method);
        debug!("RPC request: {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(remaining)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::DeadlineExceeded
                } else {
                    TransportError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let peer = PeerId::from_bytes([0xab; 32]);
        let transport = HttpTransport::new("http://127.0.0.1:40001/");
        assert_eq!(
            transport.url(&peer, "getLatestPrices"),
            format!("http://127.0.0.1:40001/rpc/{}/getLatestPrices", "ab".repeat(32))
        );
    }
}
