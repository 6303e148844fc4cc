use async_trait::async_trait;

use crate::Result;

use super::types::{ChatReply, ChatRequest};

/// Model client interface used by the chat service.
///
/// Implementations own their transport, credentials and sampling settings.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier reported in logs.
    fn model_id(&self) -> &str;

    async fn complete(&self, req: ChatRequest) -> Result<ChatReply>;
}
