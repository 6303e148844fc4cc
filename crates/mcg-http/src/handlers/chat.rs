use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use mcg_core::domain::SessionKey;

use super::ApiError;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub response: String,
}

/// `POST /api/chat`: relay a text or Morse message to the model.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Some(message) = body
        .ok()
        .and_then(|Json(b)| b.message)
        .filter(|m| !m.trim().is_empty())
    else {
        return Err(ApiError::bad_request("No message provided"));
    };

    let key = session_key(&headers, &state.cfg.session_header)?;
    tracing::info!(
        session = key.as_ref().map(SessionKey::as_str).unwrap_or("-"),
        "received message: {message}"
    );

    let outcome = state.chat.chat(key.as_ref(), &message).await?;

    Ok(Json(ChatResponse {
        status: "success",
        response: outcome.response,
    }))
}

/// Absent header means an anonymous, unsaved conversation; a malformed one is rejected.
fn session_key(headers: &HeaderMap, name: &str) -> Result<Option<SessionKey>, ApiError> {
    let Some(raw) = headers.get(name) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(SessionKey::parse)
        .map(Some)
        .ok_or_else(|| ApiError::bad_request("Invalid session id"))
}
