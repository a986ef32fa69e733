//! Wire contract of the query protocol.
//!
//! Requests and responses are UTF-8 JSON. A successful response is the bare
//! symbol-keyed result map; a failed one is an [`ErrorPayload`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pricefeed_core::snapshots::TimeRange;

/// The operations a query server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetLatestPrices,
    GetHistoricalPrices,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetLatestPrices => "getLatestPrices",
            Method::GetHistoricalPrices => "getHistoricalPrices",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "getLatestPrices" => Ok(Method::GetLatestPrices),
            "getHistoricalPrices" => Ok(Method::GetHistoricalPrices),
            other => Err(format!("Unknown method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPricesRequest {
    #[serde(default)]
    pub pairs: Vec<String>,
}

/// Range request; an empty `pairs` means every symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPricesRequest {
    #[serde(default)]
    pub pairs: Vec<String>,
    #[serde(default)]
    pub from: i64,
    /// Defaults to the time the server receives the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

impl HistoricalPricesRequest {
    pub fn range(&self, now_ms: i64) -> TimeRange {
        TimeRange::new(self.from, self.to.unwrap_or(now_ms))
    }

    pub fn symbols(&self) -> BTreeSet<String> {
        self.pairs.iter().cloned().collect()
    }
}

/// Category of a server-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    BadRequest,
    Storage,
    UnknownMethod,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadRequest => "badRequest",
            ErrorKind::Storage => "storage",
            ErrorKind::UnknownMethod => "unknownMethod",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: ErrorKind,
}

impl ErrorPayload {
    pub fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind,
        }
    }
}

/// A response as read off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireResponse<T> {
    Error(ErrorPayload),
    Ok(T),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricefeed_core::snapshots::LatestPrices;

    #[test]
    fn test_method_names() {
        for method in [Method::GetLatestPrices, Method::GetHistoricalPrices] {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
        assert!("getPrices".parse::<Method>().is_err());
    }

    #[test]
    fn test_historical_request_defaults() {
        let request: HistoricalPricesRequest = serde_json::from_str("{}").unwrap();
        assert!(request.pairs.is_empty());
        assert_eq!(request.range(5_000), TimeRange::new(0, 5_000));

        let request: HistoricalPricesRequest =
            serde_json::from_str(r#"{"pairs":["btc"],"from":1500,"to":2000}"#).unwrap();
        assert_eq!(request.range(9_999), TimeRange::new(1500, 2000));
    }

    #[test]
    fn test_error_payload_wins_over_result_map() {
        let body = r#"{"error":"Store is closed","kind":"storage"}"#;
        let response: WireResponse<LatestPrices> = serde_json::from_str(body).unwrap();
        assert_eq!(
            response,
            WireResponse::Error(ErrorPayload::new(ErrorKind::Storage, "Store is closed"))
        );

        let response: WireResponse<LatestPrices> =
            serde_json::from_str(r#"{"BTC":{"averagePrice":51000.0,"timestamp":2000}}"#).unwrap();
        match response {
            WireResponse::Ok(prices) => assert_eq!(prices["BTC"].timestamp, 2000),
            other => panic!("unexpected response: {other:?}"),
        }

        let response: WireResponse<LatestPrices> = serde_json::from_str("{}").unwrap();
        assert_eq!(response, WireResponse::Ok(LatestPrices::new()));
    }
}
