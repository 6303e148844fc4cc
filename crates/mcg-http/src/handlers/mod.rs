//! HTTP request handlers.
//!
//! Each handler is a small adapter that:
//! - validates the JSON body (and session header for chat)
//! - calls into `mcg-core` (codec or chat service)
//! - shapes the `{status: ...}` JSON envelope

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

mod chat;
mod health;
mod morse;

pub use chat::chat;
pub use health::{health, index};
pub use morse::encode_morse;

/// Error envelope: `{"status": "error", "error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            retry_after_secs: None,
        }
    }
}

impl From<mcg_core::Error> for ApiError {
    fn from(e: mcg_core::Error) -> Self {
        let message = e.to_string();
        match e {
            mcg_core::Error::RateLimited { retry_after } => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message,
                retry_after_secs: Some(mcg_core::errors::retry_after_secs(&retry_after)),
            },
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message,
                retry_after_secs: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "status": "error", "error": self.message }));
        let mut resp = (self.status, body).into_response();
        if let Some(secs) = self.retry_after_secs {
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        resp
    }
}
