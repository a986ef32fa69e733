use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::post,
    Router,
};
use pricefeed_rpc::PeerId;

/// Carries one query-protocol request addressed to `peer`.
///
/// Protocol-level failures come back as 200 with an error payload; only
/// addressing problems are HTTP errors.
async fn call(
    State(state): State<Arc<AppState>>,
    Path((peer, method)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let peer: PeerId = peer
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid peer id: {}", e)))?;
    if peer != state.peer_id {
        return Err(ApiError::NotFound(format!("Unknown peer: {}", peer)));
    }

    let reply = state.query_service.respond(&method, &body).await;
    Ok(([(header::CONTENT_TYPE, "application/json")], reply))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/rpc/{peer}/{method}", post(call))
}
