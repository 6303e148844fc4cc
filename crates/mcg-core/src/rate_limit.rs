use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::domain::SessionKey;

// ============== Rate Limiter (Token Bucket) ==============

#[derive(Clone, Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

impl Bucket {
    fn full(max: f64, now: Instant) -> Self {
        Self {
            tokens: max,
            last_update: now,
        }
    }

    fn refill(&mut self, now: Instant, max: f64, refill_per_sec: f64) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(max);
        self.last_update = now;
    }

    /// Seconds until one token is available, `None` when refill is zero.
    fn wait(&self, refill_per_sec: f64) -> Option<Duration> {
        if refill_per_sec <= 0.0 {
            return None;
        }
        let secs = (1.0 - self.tokens) / refill_per_sec;
        Some(Duration::from_secs_f64(secs.max(0.0)))
    }
}

/// Token buckets for chat requests.
///
/// Every request draws from one server-wide bucket, so rotating session ids
/// cannot raise throughput past it. Each session (and the shared anonymous
/// slot) also has its own bucket that keeps one client from draining the
/// global one. Idle session buckets are pruned when a new key arrives, and at
/// most `max_sessions` are tracked.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    enabled: bool,
    window: Duration,
    session_max: f64,
    session_refill: f64,
    global_max: f64,
    global_refill: f64,
    global: Option<Bucket>,
    max_sessions: usize,
    buckets: HashMap<Option<SessionKey>, Bucket>,
}

impl RateLimiter {
    pub fn new(
        enabled: bool,
        session_requests: u32,
        global_requests: u32,
        window: Duration,
        max_sessions: usize,
    ) -> Self {
        let window_secs = window.as_secs_f64().max(1e-9);
        let session_max = session_requests as f64;
        let global_max = global_requests as f64;

        Self {
            enabled,
            window,
            session_max,
            session_refill: session_max / window_secs,
            global_max,
            global_refill: global_max / window_secs,
            global: None,
            max_sessions: max_sessions.max(1),
            buckets: HashMap::new(),
        }
    }

    /// Take one token; on denial returns how long until the next token.
    pub fn check(&mut self, key: Option<&SessionKey>) -> (bool, Option<Duration>) {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&mut self, key: Option<&SessionKey>, now: Instant) -> (bool, Option<Duration>) {
        if !self.enabled {
            return (true, None);
        }

        let (global_max, global_refill) = (self.global_max, self.global_refill);
        let global = self
            .global
            .get_or_insert_with(|| Bucket::full(global_max, now));
        global.refill(now, global_max, global_refill);

        let owned = key.cloned();
        if !self.buckets.contains_key(&owned) {
            self.prune(now);
        }
        let (session_max, session_refill) = (self.session_max, self.session_refill);
        let bucket = self
            .buckets
            .entry(owned)
            .or_insert_with(|| Bucket::full(session_max, now));
        bucket.refill(now, session_max, session_refill);

        if bucket.tokens < 1.0 {
            return (false, bucket.wait(session_refill));
        }
        let Some(global) = self.global.as_mut() else {
            return (true, None);
        };
        if global.tokens < 1.0 {
            tracing::warn!("global rate limit reached");
            return (false, global.wait(global_refill));
        }

        bucket.tokens -= 1.0;
        global.tokens -= 1.0;
        (true, None)
    }

    /// Number of tracked session buckets.
    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }

    /// Drop buckets idle for a full window (they would be full again anyway),
    /// then the least recently used ones until there is room for one more.
    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.buckets
            .retain(|_, b| now.saturating_duration_since(b.last_update) < window);

        while self.buckets.len() >= self.max_sessions {
            let Some(oldest) = self
                .buckets
                .iter()
                .min_by_key(|(_, b)| b.last_update)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            self.buckets.remove(&oldest);
        }
    }
}
