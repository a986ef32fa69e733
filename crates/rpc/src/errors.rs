//! Error types for the query protocol.

use std::time::Duration;

use thiserror::Error;

use crate::peer::PeerId;
use crate::protocol::ErrorKind;

/// Failure of a transport to deliver a request or return its reply.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No handler is registered for the addressed peer.
    #[error("Unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// The remote end answered at the transport level with a failure status.
    #[error("Transport request failed: {status} {body}")]
    Status { status: u16, body: String },

    /// The deadline passed while the transport was still waiting.
    #[error("Transport deadline exceeded")]
    DeadlineExceeded,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// What a [`QueryClient`](crate::QueryClient) call returns instead of a result.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No reply arrived before the deadline.
    #[error("{method} timed out after {}ms", after.as_millis())]
    Timeout { method: String, after: Duration },

    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server answered with an error payload.
    #[error("Server error ({kind}): {message}")]
    Remote { kind: ErrorKind, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout { .. })
    }
}

impl From<TransportError> for QueryError {
    fn from(err: TransportError) -> Self {
        QueryError::Transport(err.to_string())
    }
}
