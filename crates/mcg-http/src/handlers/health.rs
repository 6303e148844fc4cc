use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::router::AppState;

const BANNER: &str =
    "Morse Code Chatbot API server is running. Send POST requests to /api/chat endpoint.";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub conversations_count: usize,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// `GET /`
pub async fn index() -> &'static str {
    BANNER
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        conversations_count: state.chat.conversation_count().await,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}
