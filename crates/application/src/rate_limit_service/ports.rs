use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use prcard_core::AppResult;

/// Repository port for sliding-window rate limit state.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Attempts to record a request for the given key at `now`.
    ///
    /// Evicts recorded requests older than `now - window`. If `max_attempts`
    /// or more remain the request is refused and not recorded; otherwise `now`
    /// is appended. Evict, compare and append must be atomic per key.
    async fn try_acquire(
        &self,
        key: &str,
        max_attempts: u32,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo>;
}

/// Outcome of one rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInfo {
    /// Whether the request was accepted and recorded.
    pub accepted: bool,
    /// Requests recorded in the window after this call.
    pub attempt_count: u32,
    /// Oldest request still inside the window, if any.
    pub oldest_attempt_at: Option<DateTime<Utc>>,
}
