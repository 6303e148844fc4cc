//! Anthropic adapter (Messages API).
//!
//! Implements the `mcg-core` [`ModelClient`] port over `POST /v1/messages`.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;

use mcg_core::{
    config::Config,
    errors::Error,
    model::{
        client::ModelClient,
        types::{ChatReply, ChatRequest},
    },
    Result,
};

use crate::types::{ErrorResponse, MessagesRequest, MessagesResponse};

pub const API_VERSION: &str = "2023-06-01";

#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            api_key: cfg.anthropic_api_key.clone(),
            base_url: cfg.anthropic_base_url.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: Some(cfg.temperature),
            timeout: cfg.model_timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnthropicClient {
    cfg: AnthropicConfig,
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(cfg: AnthropicConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::External(format!("anthropic client build error: {e}")))?;
        Ok(Self { cfg, http })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.cfg.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn model_id(&self) -> &str {
        &self.cfg.model
    }

    async fn complete(&self, req: ChatRequest) -> Result<ChatReply> {
        let body = MessagesRequest {
            model: &self.cfg.model,
            max_tokens: self.cfg.max_tokens,
            messages: &req.messages,
            system: &req.system,
            temperature: self.cfg.temperature,
        };

        let resp = self
            .http
            .post(self.messages_url())
            .header("x-api-key", &self.cfg.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("anthropic request error: {e}")))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1);
            return Err(Error::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(describe_failure(status.as_u16(), &body)));
        }

        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("anthropic json error: {e}")))?;

        tracing::debug!(
            stop_reason = parsed.stop_reason.as_deref().unwrap_or("-"),
            "anthropic reply"
        );

        let text = parsed.text().unwrap_or("").to_string();
        if text.trim().is_empty() {
            return Err(Error::External(
                "anthropic returned an empty reply".to_string(),
            ));
        }

        Ok(ChatReply {
            text,
            usage: parsed.token_usage(),
        })
    }
}

fn describe_failure(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(e) => format!(
            "anthropic request failed: {status} {}: {}",
            e.error.kind, e.error.message
        ),
        Err(_) => format!(
            "anthropic request failed: {status} {}",
            body.chars().take(200).collect::<String>()
        ),
    }
}
