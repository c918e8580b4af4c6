//! Redis-backed sliding-window rate limit repository.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use prcard_application::{AttemptInfo, RateLimitRepository};
use prcard_core::{AppError, AppResult};
use redis::Script;

const TRY_ACQUIRE_SCRIPT: &str = r#"
local key = KEYS[1]
local now_ms = tonumber(ARGV[1])
local window_ms = tonumber(ARGV[2])
local max_attempts = tonumber(ARGV[3])
local member = ARGV[4]

redis.call('ZREMRANGEBYSCORE', key, '-inf', '(' .. (now_ms - window_ms))

local count = redis.call('ZCARD', key)
local accepted = 0
if count < max_attempts then
  redis.call('ZADD', key, now_ms, member)
  count = count + 1
  accepted = 1
end
redis.call('PEXPIRE', key, window_ms)

local oldest_ms = -1
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if oldest[2] then
  oldest_ms = tonumber(oldest[2])
end

return {accepted, count, oldest_ms}
"#;

/// Redis implementation of the rate limit repository port.
///
/// Each key is a sorted set of request timestamps; the Lua script makes
/// evict, count and append a single atomic step shared by every instance.
pub struct RedisRateLimitRepository {
    client: redis::Client,
    key_prefix: String,
    sequence: AtomicU64,
}

impl RedisRateLimitRepository {
    /// Creates a repository with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            sequence: AtomicU64::new(0),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    /// Sorted-set members must be unique even for requests in the same millisecond.
    fn member_for(&self, now_ms: i64) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{now_ms}:{}:{sequence}", std::process::id())
    }
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn try_acquire(
        &self,
        key: &str,
        max_attempts: u32,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        let window_ms = window.num_milliseconds();
        if window_ms <= 0 {
            return Err(AppError::Validation(
                "rate limit window must be greater than zero".to_owned(),
            ));
        }

        let now_ms = now.timestamp_millis();
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        let script = Script::new(TRY_ACQUIRE_SCRIPT);
        let (accepted, attempt_count, oldest_ms): (i64, i64, i64) = script
            .key(self.key_for(key))
            .arg(now_ms)
            .arg(window_ms)
            .arg(max_attempts)
            .arg(self.member_for(now_ms))
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to check redis rate limit: {error}"))
            })?;

        let attempt_count = u32::try_from(attempt_count)
            .map_err(|error| AppError::Internal(format!("invalid redis attempt count: {error}")))?;
        let oldest_attempt_at = if oldest_ms < 0 {
            None
        } else {
            Some(
                Utc.timestamp_millis_opt(oldest_ms)
                    .single()
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "invalid redis attempt timestamp: {oldest_ms}"
                        ))
                    })?,
            )
        };

        Ok(AttemptInfo {
            accepted: accepted == 1,
            attempt_count,
            oldest_attempt_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{TimeDelta, Utc};
    use prcard_application::RateLimitRepository;
    use prcard_core::AppError;

    use super::RedisRateLimitRepository;

    fn repository(url: &str, key_prefix: &str) -> RedisRateLimitRepository {
        let client = redis::Client::open(url)
            .unwrap_or_else(|error| panic!("invalid redis url in test: {error}"));
        RedisRateLimitRepository::new(client, key_prefix)
    }

    fn offline_repository() -> RedisRateLimitRepository {
        repository("redis://127.0.0.1:6379/", "prcard:rate")
    }

    #[test]
    fn keys_are_namespaced_by_prefix() {
        let repository = offline_repository();

        assert_eq!(
            repository.key_for("chat:203.0.113.7"),
            "prcard:rate:chat:203.0.113.7"
        );
    }

    #[test]
    fn members_are_unique_within_one_millisecond() {
        let repository = offline_repository();
        let now_ms = 1_700_000_000_000;

        let members: HashSet<String> = (0..100).map(|_| repository.member_for(now_ms)).collect();

        assert_eq!(members.len(), 100);
        assert!(
            members
                .iter()
                .all(|member| member.starts_with("1700000000000:"))
        );
    }

    #[tokio::test]
    async fn empty_window_is_rejected_before_connecting() {
        let repository = offline_repository();

        let result = repository
            .try_acquire("chat:client", 10, TimeDelta::zero(), Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn sliding_window_refuses_then_recovers() {
        let Ok(redis_url) = std::env::var("REDIS_URL") else {
            return;
        };
        let prefix = format!(
            "prcard:test:{}:{}",
            std::process::id(),
            Utc::now().timestamp_millis()
        );
        let repository = repository(&redis_url, &prefix);
        let window = TimeDelta::seconds(60);
        let start = Utc::now();

        for attempt in 1..=3 {
            let info = repository
                .try_acquire("client", 3, window, start)
                .await
                .unwrap_or_else(|error| panic!("redis acquire failed: {error}"));
            assert!(info.accepted);
            assert_eq!(info.attempt_count, attempt);
        }

        let refused = repository
            .try_acquire("client", 3, window, start + TimeDelta::seconds(1))
            .await
            .unwrap_or_else(|error| panic!("redis acquire failed: {error}"));
        assert!(!refused.accepted);
        assert_eq!(refused.attempt_count, 3);
        assert_eq!(
            refused.oldest_attempt_at.map(|at| at.timestamp_millis()),
            Some(start.timestamp_millis())
        );

        let later = repository
            .try_acquire("client", 3, window, start + TimeDelta::seconds(61))
            .await
            .unwrap_or_else(|error| panic!("redis acquire failed: {error}"));
        assert!(later.accepted);
        assert_eq!(later.attempt_count, 1);
    }
}
