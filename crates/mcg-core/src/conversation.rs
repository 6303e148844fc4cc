//! In-memory conversation history keyed by [`SessionKey`].

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{domain::SessionKey, model::types::ChatMessage, prompt::priming_messages};

const PRIMING_LEN: usize = 2;

/// Limits for [`ConversationStore`]. Zero disables the matching limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreLimits {
    pub max_history_messages: usize,
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

struct Entry {
    history: Arc<Mutex<Vec<ChatMessage>>>,
    last_used: Instant,
}

impl Entry {
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.history) > 1
    }
}

/// Session store owned by the chat service.
///
/// Each key has its own lock; holding a [`Conversation`] serializes all other
/// requests for the same key until it is dropped. Conversations idle longer
/// than `idle_ttl` are dropped when a new key is added, and once
/// `max_sessions` is reached the least recently used idle one makes room.
pub struct ConversationStore {
    limits: StoreLimits,
    inner: Mutex<HashMap<SessionKey, Entry>>,
}

enum Slot {
    Stored(OwnedMutexGuard<Vec<ChatMessage>>),
    Ephemeral(Vec<ChatMessage>),
}

/// Exclusive access to one conversation's history.
pub struct Conversation {
    slot: Slot,
    max_history_messages: usize,
}

impl ConversationStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            limits,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Lock (creating and priming if needed) the conversation for `key`.
    pub async fn lock(&self, key: &SessionKey) -> Conversation {
        self.lock_at(key, Instant::now()).await
    }

    async fn lock_at(&self, key: &SessionKey, now: Instant) -> Conversation {
        let lock = {
            let mut map = self.inner.lock().await;
            if !map.contains_key(key) {
                self.evict(&mut map, now);
            }
            let entry = map.entry(key.clone()).or_insert_with(|| Entry {
                history: Arc::new(Mutex::new(priming_messages().to_vec())),
                last_used: now,
            });
            entry.last_used = now;
            entry.history.clone()
        };
        Conversation {
            slot: Slot::Stored(lock.lock_owned().await),
            max_history_messages: self.limits.max_history_messages,
        }
    }

    /// A primed conversation that is never stored.
    pub fn ephemeral(&self) -> Conversation {
        Conversation {
            slot: Slot::Ephemeral(priming_messages().to_vec()),
            max_history_messages: self.limits.max_history_messages,
        }
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    fn evict(&self, map: &mut HashMap<SessionKey, Entry>, now: Instant) {
        let ttl = self.limits.idle_ttl;
        if !ttl.is_zero() {
            map.retain(|_, e| e.in_use() || now.saturating_duration_since(e.last_used) < ttl);
        }

        let max = self.limits.max_sessions;
        if max == 0 {
            return;
        }
        while map.len() >= max {
            let Some(oldest) = map
                .iter()
                .filter(|(_, e)| !e.in_use())
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            else {
                tracing::warn!(sessions = map.len(), "session store full of active conversations");
                break;
            };
            tracing::debug!(session = oldest.as_str(), "evicting conversation");
            map.remove(&oldest);
        }
    }
}

impl Conversation {
    pub fn messages(&self) -> &[ChatMessage] {
        match &self.slot {
            Slot::Stored(guard) => guard.as_slice(),
            Slot::Ephemeral(v) => v.as_slice(),
        }
    }

    /// Append a completed user/assistant exchange, then apply the history cap.
    pub fn record_exchange(&mut self, user: ChatMessage, assistant: ChatMessage) {
        let max = self.max_history_messages;
        let history = self.history_mut();
        history.push(user);
        history.push(assistant);

        if max == 0 {
            return;
        }
        // Drop whole exchanges, oldest first; the priming pair always stays.
        while history.len() - PRIMING_LEN > max && history.len() >= PRIMING_LEN + 2 {
            history.drain(PRIMING_LEN..PRIMING_LEN + 2);
        }
    }

    fn history_mut(&mut self) -> &mut Vec<ChatMessage> {
        match &mut self.slot {
            Slot::Stored(guard) => &mut **guard,
            Slot::Ephemeral(v) => v,
        }
    }
}
