use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use prcard_core::{AppError, AppResult};

use super::config::RateLimitRule;
use super::ports::RateLimitRepository;

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitRepository>) -> Self {
        Self { repository }
    }

    /// Checks whether the given key is within the rate limit.
    ///
    /// Records the attempt and returns `Ok(())` if allowed, or
    /// `Err(AppError::RateLimited)` if the limit has been exceeded. Refused
    /// attempts do not count against the window.
    ///
    /// The key is scoped by the rule category, so one client identifier can be
    /// limited independently per endpoint.
    pub async fn check_rate_limit(&self, rule: &RateLimitRule, key: &str) -> AppResult<()> {
        self.check_rate_limit_at(rule, key, Utc::now()).await
    }

    /// Same as [`Self::check_rate_limit`] with an explicit clock reading.
    pub async fn check_rate_limit_at(
        &self,
        rule: &RateLimitRule,
        key: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let window = TimeDelta::try_seconds(rule.window_seconds)
            .filter(|window| *window > TimeDelta::zero())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "rate limit window for '{}' must be a positive number of seconds",
                    rule.category
                ))
            })?;

        let composite_key = format!("{}:{key}", rule.category);
        let info = self
            .repository
            .try_acquire(&composite_key, rule.max_attempts, window, now)
            .await?;

        if !info.accepted {
            let retry_after_seconds = info
                .oldest_attempt_at
                .map(|oldest| (oldest + window - now).num_seconds().max(1))
                .unwrap_or(rule.window_seconds);
            warn!(
                category = %rule.category,
                attempts = info.attempt_count,
                retry_after_seconds,
                "rate limit exceeded"
            );
            return Err(AppError::RateLimited(format!(
                "too many requests, please try again in {retry_after_seconds} seconds"
            )));
        }

        Ok(())
    }
}
