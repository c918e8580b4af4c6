use std::sync::Arc;

use prcard_application::{RateLimitRepository, RateLimitService};
use prcard_core::{AppError, AppResult};
use prcard_infrastructure::{InMemoryRateLimitRepository, RedisRateLimitRepository};

use crate::api_config::{ApiConfig, RateLimitStoreConfig};
use crate::api_services::redis::build_redis_client;

pub(super) fn build_rate_limit_service(config: &ApiConfig) -> AppResult<RateLimitService> {
    let rate_limit_repository: Arc<dyn RateLimitRepository> = match config.rate_limit_store {
        RateLimitStoreConfig::Memory => Arc::new(InMemoryRateLimitRepository::new()),
        RateLimitStoreConfig::Redis => {
            let redis_url = config.redis_url.as_deref().ok_or_else(|| {
                AppError::Validation("REDIS_URL is required when RATE_LIMIT_STORE=redis".to_owned())
            })?;
            Arc::new(RedisRateLimitRepository::new(
                build_redis_client(redis_url)?,
                "prcard:rate_limit",
            ))
        }
    };

    Ok(RateLimitService::new(rate_limit_repository))
}
