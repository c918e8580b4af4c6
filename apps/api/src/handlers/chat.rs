use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use prcard_core::AppError;
use prcard_domain::{ChatReply, ChatRequest};

use crate::dto::{ChatRequestBody, ChatResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::json_payload;

const UNKNOWN_CLIENT: &str = "unknown";

/// Answers a question about one form field.
///
/// The body is validated first, so rejected requests never consume the
/// caller's quota. A throttled caller gets a 429 in the normal reply shape so
/// the page can show the warning inline.
pub async fn chat_handler(
    State(state): State<AppState>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> ApiResult<Response> {
    let request = ChatRequest::try_from(json_payload(payload)?)?;
    let peer = connect_info.map(|Extension(ConnectInfo(address))| address);
    let key = client_key(&headers, peer);

    match state
        .rate_limit_service
        .check_rate_limit(&state.chat_rate_limit_rule, &key)
        .await
    {
        Ok(()) => {}
        Err(AppError::RateLimited(message)) => {
            let reply = ChatResponse::from(ChatReply::rate_limited(&message));
            return Ok((StatusCode::TOO_MANY_REQUESTS, Json(reply)).into_response());
        }
        Err(error) => return Err(error.into()),
    }

    let reply = state.chat_service.reply(&request).await?;

    Ok(Json(ChatResponse::from(reply)).into_response())
}

/// Identifies the caller: first `X-Forwarded-For` entry, then the peer
/// address, then a shared fallback bucket.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| peer.map(|address| address.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}
