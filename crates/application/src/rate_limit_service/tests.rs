use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::sync::Mutex;

use prcard_core::{AppError, AppResult};

use super::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};

#[derive(Default)]
struct FakeRateLimitRepository {
    windows: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

#[async_trait]
impl RateLimitRepository for FakeRateLimitRepository {
    async fn try_acquire(
        &self,
        key: &str,
        max_attempts: u32,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        let mut windows = self.windows.lock().await;
        let timestamps = windows.entry(key.to_owned()).or_default();
        timestamps.retain(|timestamp| *timestamp >= now - window);

        let accepted = timestamps.len() < max_attempts as usize;
        if accepted {
            timestamps.push(now);
        }

        Ok(AttemptInfo {
            accepted,
            attempt_count: timestamps.len() as u32,
            oldest_attempt_at: timestamps.first().copied(),
        })
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

fn service() -> RateLimitService {
    RateLimitService::new(Arc::new(FakeRateLimitRepository::default()))
}

#[tokio::test]
async fn eleventh_request_in_window_is_refused() {
    let service = service();
    let rule = RateLimitRule::chat();

    for second in 0..10 {
        let result = service
            .check_rate_limit_at(&rule, "203.0.113.7", start() + TimeDelta::seconds(second))
            .await;
        assert!(result.is_ok());
    }

    let refused = service
        .check_rate_limit_at(&rule, "203.0.113.7", start() + TimeDelta::seconds(30))
        .await;
    assert!(matches!(refused, Err(AppError::RateLimited(_))));
}

#[tokio::test]
async fn window_slides_after_first_request_ages_out() {
    let service = service();
    let rule = RateLimitRule::chat();

    for _ in 0..10 {
        assert!(
            service
                .check_rate_limit_at(&rule, "client", start())
                .await
                .is_ok()
        );
    }

    let later = start() + TimeDelta::seconds(61);
    assert!(
        service
            .check_rate_limit_at(&rule, "client", later)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn clients_and_categories_are_limited_independently() {
    let service = service();
    let rule = RateLimitRule::new("chat", 1, 60);
    let other_rule = RateLimitRule::new("stamp", 1, 60);

    assert!(service.check_rate_limit_at(&rule, "a", start()).await.is_ok());
    assert!(service.check_rate_limit_at(&rule, "b", start()).await.is_ok());
    assert!(
        service
            .check_rate_limit_at(&other_rule, "a", start())
            .await
            .is_ok()
    );
    assert!(service.check_rate_limit_at(&rule, "a", start()).await.is_err());
}

#[tokio::test]
async fn refusal_reports_time_until_oldest_request_expires() {
    let service = service();
    let rule = RateLimitRule::new("chat", 1, 60);

    assert!(service.check_rate_limit_at(&rule, "a", start()).await.is_ok());
    let refused = service
        .check_rate_limit_at(&rule, "a", start() + TimeDelta::seconds(20))
        .await;

    let Err(AppError::RateLimited(message)) = refused else {
        unreachable!("second request must be refused");
    };
    assert!(message.contains("40 seconds"));
}

#[tokio::test]
async fn non_positive_window_is_rejected() {
    let service = service();
    let rule = RateLimitRule::new("chat", 10, 0);

    let result = service.check_rate_limit_at(&rule, "a", start()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}
