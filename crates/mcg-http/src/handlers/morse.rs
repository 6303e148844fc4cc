use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};

use mcg_core::morse::encode;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct MorseBody {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MorseResponse {
    pub status: &'static str,
    pub original: String,
    pub morse: String,
}

/// `POST /api/morse`: text to Morse.
pub async fn encode_morse(
    body: Result<Json<MorseBody>, JsonRejection>,
) -> Result<Json<MorseResponse>, ApiError> {
    let Some(original) = body.ok().and_then(|Json(b)| b.text) else {
        return Err(ApiError::bad_request("No text provided"));
    };

    let morse = encode(&original);
    Ok(Json(MorseResponse {
        status: "success",
        original,
        morse,
    }))
}
