//! Process-local sliding-window rate limit repository.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use prcard_application::{AttemptInfo, RateLimitRepository};
use prcard_core::{AppError, AppResult};
use tokio::sync::{Mutex, RwLock};

type Window = Arc<Mutex<VecDeque<DateTime<Utc>>>>;

/// In-memory implementation of the rate limit repository port.
///
/// Each key owns its own lock, so checks for different clients never wait on
/// each other. Keys are never evicted.
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    windows: RwLock<HashMap<String, Window>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn window_for(&self, key: &str) -> Window {
        if let Some(window) = self.windows.read().await.get(key) {
            return Arc::clone(window);
        }

        Arc::clone(
            self.windows
                .write()
                .await
                .entry(key.to_owned())
                .or_default(),
        )
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn try_acquire(
        &self,
        key: &str,
        max_attempts: u32,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        if window <= TimeDelta::zero() {
            return Err(AppError::Validation(
                "rate limit window must be greater than zero".to_owned(),
            ));
        }

        let timestamps = self.window_for(key).await;
        let mut timestamps = timestamps.lock().await;

        let cutoff = now - window;
        while timestamps.front().is_some_and(|oldest| *oldest < cutoff) {
            timestamps.pop_front();
        }

        let limit = usize::try_from(max_attempts).unwrap_or(usize::MAX);
        let accepted = timestamps.len() < limit;
        if accepted {
            timestamps.push_back(now);
        }

        let attempt_count = u32::try_from(timestamps.len()).map_err(|error| {
            AppError::Internal(format!("invalid in-memory attempt count: {error}"))
        })?;

        Ok(AttemptInfo {
            accepted,
            attempt_count,
            oldest_attempt_at: timestamps.front().copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone, Utc};
    use prcard_application::RateLimitRepository;

    use super::InMemoryRateLimitRepository;

    fn at(seconds: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    #[tokio::test]
    async fn refuses_once_the_window_is_full() {
        let repository = InMemoryRateLimitRepository::new();
        let window = TimeDelta::seconds(60);

        for second in 0..3 {
            let attempt = repository.try_acquire("ip", 3, window, at(second)).await;
            assert!(attempt.is_ok_and(|attempt| attempt.accepted));
        }

        let refused = repository.try_acquire("ip", 3, window, at(3)).await;
        let refused = refused.unwrap_or_else(|_| unreachable!());
        assert!(!refused.accepted);
        assert_eq!(refused.attempt_count, 3);
        assert_eq!(refused.oldest_attempt_at, Some(at(0)));
    }

    #[tokio::test]
    async fn old_attempts_slide_out_of_the_window() {
        let repository = InMemoryRateLimitRepository::new();
        let window = TimeDelta::seconds(60);

        assert!(repository.try_acquire("ip", 1, window, at(0)).await.is_ok());
        let refused = repository.try_acquire("ip", 1, window, at(59)).await;
        assert!(refused.is_ok_and(|attempt| !attempt.accepted));

        let accepted = repository.try_acquire("ip", 1, window, at(61)).await;
        assert!(accepted.is_ok_and(|attempt| attempt.accepted && attempt.attempt_count == 1));
    }

    #[tokio::test]
    async fn refused_attempts_are_not_recorded() {
        let repository = InMemoryRateLimitRepository::new();
        let window = TimeDelta::seconds(10);

        assert!(repository.try_acquire("ip", 1, window, at(0)).await.is_ok());
        for second in 1..10 {
            assert!(repository.try_acquire("ip", 1, window, at(second)).await.is_ok());
        }

        let accepted = repository.try_acquire("ip", 1, window, at(11)).await;
        assert!(accepted.is_ok_and(|attempt| attempt.accepted));
    }

    #[tokio::test]
    async fn concurrent_checks_never_exceed_the_limit() {
        let repository = Arc::new(InMemoryRateLimitRepository::new());
        let window = TimeDelta::seconds(60);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repository = Arc::clone(&repository);
                tokio::spawn(async move {
                    repository
                        .try_acquire("shared", 10, window, at(0))
                        .await
                        .is_ok_and(|attempt| attempt.accepted)
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap_or(false) {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 10);
    }

    #[tokio::test]
    async fn zero_window_is_rejected() {
        let repository = InMemoryRateLimitRepository::new();

        let result = repository
            .try_acquire("ip", 1, TimeDelta::zero(), at(0))
            .await;

        assert!(result.is_err());
    }
}
