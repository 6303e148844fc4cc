use std::time::Duration;

/// Core error type for the gateway.
///
/// Adapter crates map their specific errors into this type so the HTTP layer
/// can turn failures into consistent responses (client error vs upstream error).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("rate limited (retry after {}s)", retry_after_secs(.retry_after))]
    RateLimited { retry_after: Duration },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Whole seconds to wait, rounded up, never below one.
pub fn retry_after_secs(wait: &Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}
