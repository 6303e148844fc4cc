use std::sync::Arc;

use mcg_anthropic::{AnthropicClient, AnthropicConfig};
use mcg_core::{chat::ChatService, config::Config};

#[tokio::main]
async fn main() -> Result<(), mcg_core::Error> {
    mcg_core::logging::init("mcg")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        model = %cfg.model,
        base_url = %cfg.anthropic_base_url,
        max_tokens = cfg.max_tokens,
        temperature = cfg.temperature,
        "starting Morse chat gateway"
    );

    let model = Arc::new(AnthropicClient::new(AnthropicConfig::from_config(&cfg))?);
    let chat = Arc::new(ChatService::new(&cfg, model));

    mcg_http::serve(cfg, chat)
        .await
        .map_err(|e| mcg_core::Error::External(format!("http server failed: {e}")))?;

    Ok(())
}
