//! Pricefeed RPC - the query protocol served against the snapshot store.
//!
//! Two operations, `getLatestPrices` and `getHistoricalPrices`, carried as
//! UTF-8 JSON payloads over an opaque [`Transport`] addressed by [`PeerId`].
//!
//! ```text
//! QueryClient ──(deadline)──> Transport ──> RequestHandler (QueryService) ──> SnapshotStore
//!      ▲                                              │
//!      └──── WireResponse: result map | ErrorPayload ─┘
//! ```
//!
//! - [`QueryService`] answers every request with a payload, never a fault.
//! - [`QueryClient`] bounds every call by a deadline and turns every failure
//!   into a [`QueryError`].

pub mod client;
pub mod errors;
pub mod peer;
pub mod protocol;
pub mod service;
pub mod transport;

pub use client::{QueryClient, DEFAULT_TIMEOUT};
pub use errors::{QueryError, TransportError};
pub use peer::PeerId;
pub use protocol::{
    ErrorKind, ErrorPayload, HistoricalPricesRequest, LatestPricesRequest, Method, WireResponse,
};
pub use service::QueryService;
pub use transport::{CallContext, HttpTransport, LoopbackTransport, RequestHandler, Transport};
