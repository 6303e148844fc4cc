use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    conversation::{ConversationStore, StoreLimits},
    domain::SessionKey,
    errors::Error,
    language::enforce_english,
    model::{
        client::ModelClient,
        types::{ChatMessage, ChatRequest},
    },
    prompt::{classify_input, compose_user_message, system_prompt_at, InputKind},
    rate_limit::RateLimiter,
    Result,
};

#[derive(Clone, Debug)]
pub struct ChatOutcome {
    pub response: String,
    pub input: InputKind,
    pub replaced_by_fallback: bool,
}

/// Relays one user message to the model with Morse decoding, session history,
/// and the English-only post-filter.
pub struct ChatService {
    system_prompt: String,
    model: Arc<dyn ModelClient>,
    conversations: ConversationStore,
    rate_limiter: Mutex<RateLimiter>,
}

impl ChatService {
    pub fn new(cfg: &Config, model: Arc<dyn ModelClient>) -> Self {
        Self {
            system_prompt: cfg.system_prompt.clone(),
            model,
            conversations: ConversationStore::new(StoreLimits {
                max_history_messages: cfg.max_history_messages,
                max_sessions: cfg.max_sessions,
                idle_ttl: cfg.session_idle_ttl,
            }),
            rate_limiter: Mutex::new(RateLimiter::new(
                cfg.rate_limit_enabled,
                cfg.rate_limit_requests,
                cfg.rate_limit_global_requests,
                cfg.rate_limit_window,
                cfg.max_sessions,
            )),
        }
    }

    /// Number of stored conversations.
    pub async fn conversation_count(&self) -> usize {
        self.conversations.len().await
    }

    /// Run one chat turn.
    ///
    /// Without a session key the turn runs against a fresh, unsaved
    /// conversation. History is only updated when the model call succeeds.
    pub async fn chat(&self, key: Option<&SessionKey>, message: &str) -> Result<ChatOutcome> {
        {
            let (allowed, retry) = self.rate_limiter.lock().await.check(key);
            if !allowed {
                return Err(Error::RateLimited {
                    retry_after: retry.unwrap_or_default(),
                });
            }
        }

        let input = classify_input(message);
        match &input {
            InputKind::Morse { decoded } => {
                tracing::info!(raw = message, decoded = decoded.as_str(), "morse input decoded")
            }
            InputKind::InvalidMorse => tracing::info!(raw = message, "invalid morse input"),
            InputKind::Text => tracing::debug!("plain text input"),
        }
        let user = ChatMessage::user(compose_user_message(message, &input));

        let mut conversation = match key {
            Some(k) => self.conversations.lock(k).await,
            None => self.conversations.ephemeral(),
        };

        let mut messages = conversation.messages().to_vec();
        messages.push(user.clone());
        let req = ChatRequest {
            system: system_prompt_at(&self.system_prompt, Utc::now()),
            messages,
        };

        let reply = self.model.complete(req).await.map_err(|e| {
            tracing::error!(model = self.model.model_id(), "model call failed: {e}");
            e
        })?;
        if let Some(usage) = &reply.usage {
            tracing::info!(
                model = self.model.model_id(),
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "model usage"
            );
        }

        let (response, replaced_by_fallback) = enforce_english(reply.text);
        if replaced_by_fallback {
            tracing::warn!("model reply looked non-English; using fallback");
        }

        conversation.record_exchange(user, ChatMessage::assistant(response.clone()));
        tracing::info!(
            session = key.map(SessionKey::as_str).unwrap_or("-"),
            input = input.label(),
            "reply: {response}"
        );

        Ok(ChatOutcome {
            response,
            input,
            replaced_by_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        language::ENGLISH_ONLY_FALLBACK,
        model::types::{ChatReply, Role, TokenUsage},
    };
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct FakeModel {
        replies: StdMutex<Vec<Result<String>>>,
        seen: StdMutex<Vec<ChatRequest>>,
    }

    impl FakeModel {
        fn replying(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(replies),
                seen: StdMutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelClient for FakeModel {
        fn model_id(&self) -> &str {
            "fake"
        }

        async fn complete(&self, req: ChatRequest) -> Result<ChatReply> {
            self.seen.lock().unwrap().push(req);
            let next = self.replies.lock().unwrap().remove(0);
            next.map(|text| ChatReply { text, usage: None })
        }
    }

    fn cfg() -> Config {
        Config::from_lookup(|k| match k {
            "ANTHROPIC_API_KEY" => Some("test".to_string()),
            "SYSTEM_PROMPT" => Some("SYS".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn key(s: &str) -> SessionKey {
        SessionKey::parse(s).unwrap()
    }

    #[tokio::test]
    async fn morse_is_decoded_for_the_model() {
        let model = FakeModel::replying(vec![Ok("R SOS QSL".to_string())]);
        let svc = ChatService::new(&cfg(), model.clone());

        let out = svc.chat(Some(&key("a")), "... --- ...").await.unwrap();
        assert_eq!(out.response, "R SOS QSL");
        assert_eq!(
            out.input,
            InputKind::Morse {
                decoded: "SOS".to_string()
            }
        );
        assert!(!out.replaced_by_fallback);

        let req = &model.requests()[0];
        assert!(req.system.starts_with("SYS\n\nCURRENT TIME CONTEXT: "));
        assert!(req.system.ends_with(" KST"));
        let last = req.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            last.content,
            "User sent Morse code: ... --- ..., which means: SOS"
        );
        // Priming pair + user turn.
        assert_eq!(req.messages.len(), 3);
    }

    #[tokio::test]
    async fn invalid_morse_is_reported_to_the_model() {
        let model = FakeModel::replying(vec![Ok("QRN PLS QRS".to_string())]);
        let svc = ChatService::new(&cfg(), model.clone());

        let out = svc.chat(None, "........ ---").await.unwrap();
        assert_eq!(out.input, InputKind::InvalidMorse);
        assert_eq!(
            model.requests()[0].messages.last().unwrap().content,
            "User sent invalid Morse code: ........ ---"
        );
    }

    #[tokio::test]
    async fn history_accumulates_per_session() {
        let model = FakeModel::replying(vec![
            Ok("FB".to_string()),
            Ok("73".to_string()),
            Ok("R".to_string()),
        ]);
        let svc = ChatService::new(&cfg(), model.clone());

        svc.chat(Some(&key("a")), "hello").await.unwrap();
        svc.chat(Some(&key("a")), "bye").await.unwrap();
        svc.chat(Some(&key("b")), "hi").await.unwrap();

        let reqs = model.requests();
        assert_eq!(reqs[1].messages.len(), 5);
        assert_eq!(reqs[1].messages[2].content, "hello");
        assert_eq!(reqs[1].messages[3].content, "FB");
        assert_eq!(reqs[2].messages.len(), 3);
        assert_eq!(svc.conversation_count().await, 2);
    }

    #[tokio::test]
    async fn anonymous_turns_are_not_remembered() {
        let model = FakeModel::replying(vec![Ok("FB".to_string()), Ok("R".to_string())]);
        let svc = ChatService::new(&cfg(), model.clone());

        svc.chat(None, "hello").await.unwrap();
        svc.chat(None, "again").await.unwrap();

        assert_eq!(model.requests()[1].messages.len(), 3);
        assert_eq!(svc.conversation_count().await, 0);
    }

    #[tokio::test]
    async fn non_english_reply_is_replaced_and_stored_as_fallback() {
        let model = FakeModel::replying(vec![Ok("안녕하세요".to_string()), Ok("R".to_string())]);
        let svc = ChatService::new(&cfg(), model.clone());

        let out = svc.chat(Some(&key("a")), "hi").await.unwrap();
        assert!(out.replaced_by_fallback);
        assert_eq!(out.response, ENGLISH_ONLY_FALLBACK);

        svc.chat(Some(&key("a")), "again").await.unwrap();
        assert_eq!(
            model.requests()[1].messages[3].content,
            ENGLISH_ONLY_FALLBACK
        );
    }

    #[tokio::test]
    async fn model_failure_leaves_history_untouched() {
        let model = FakeModel::replying(vec![
            Err(Error::External("boom".to_string())),
            Ok("R".to_string()),
        ]);
        let svc = ChatService::new(&cfg(), model.clone());

        assert!(svc.chat(Some(&key("a")), "first").await.is_err());
        svc.chat(Some(&key("a")), "second").await.unwrap();

        let reqs = model.requests();
        assert_eq!(reqs[1].messages.len(), 3);
        assert_eq!(reqs[1].messages[2].content, "second");
    }

    #[tokio::test]
    async fn rate_limit_is_enforced() {
        let cfg = Config {
            rate_limit_requests: 1,
            rate_limit_window: Duration::from_secs(3600),
            ..cfg()
        };
        let model = FakeModel::replying(vec![Ok("R".to_string())]);
        let svc = ChatService::new(&cfg, model);

        svc.chat(Some(&key("a")), "one").await.unwrap();
        let err = svc.chat(Some(&key("a")), "two").await.unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
    }

    #[tokio::test]
    async fn fresh_session_ids_do_not_bypass_the_limit() {
        let cfg = Config {
            rate_limit_requests: 1,
            rate_limit_global_requests: 1,
            rate_limit_window: Duration::from_secs(3600),
            ..cfg()
        };
        let model = FakeModel::replying(vec![Ok("R".to_string())]);
        let svc = ChatService::new(&cfg, model);

        let mut allowed = 0;
        for i in 0..100 {
            match svc.chat(Some(&key(&format!("k{i}"))), "hi").await {
                Ok(_) => allowed += 1,
                Err(e) => assert!(matches!(e, Error::RateLimited { .. })),
            }
        }
        assert_eq!(allowed, 1);
        assert_eq!(svc.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn default_global_limit_follows_the_session_limit() {
        let cfg = Config::from_lookup(|k| match k {
            "ANTHROPIC_API_KEY" => Some("test".to_string()),
            "RATE_LIMIT_REQUESTS" => Some("2".to_string()),
            "RATE_LIMIT_WINDOW" => Some("3600".to_string()),
            _ => None,
        })
        .unwrap();
        let model = FakeModel::replying(vec![Ok("R".to_string()), Ok("R".to_string())]);
        let svc = ChatService::new(&cfg, model);

        assert!(svc.chat(Some(&key("a")), "one").await.is_ok());
        assert!(svc.chat(Some(&key("b")), "two").await.is_ok());
        assert!(svc.chat(Some(&key("c")), "three").await.is_err());
        assert!(svc.chat(None, "four").await.is_err());
    }

    #[tokio::test]
    async fn replies_with_usage_are_relayed() {
        let model = Arc::new(UsageModel);
        let svc = ChatService::new(&cfg(), model);
        let out = svc.chat(None, "hi").await.unwrap();
        assert_eq!(out.response, "R");
    }

    struct UsageModel;

    #[async_trait]
    impl ModelClient for UsageModel {
        fn model_id(&self) -> &str {
            "usage"
        }

        async fn complete(&self, _req: ChatRequest) -> Result<ChatReply> {
            Ok(ChatReply {
                text: "R".to_string(),
                usage: Some(TokenUsage {
                    input_tokens: 12,
                    output_tokens: 3,
                }),
            })
        }
    }
}
