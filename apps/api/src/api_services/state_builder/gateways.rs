use std::sync::Arc;
use std::time::Duration;

use prcard_application::LlmGateway;
use prcard_core::{AppError, AppResult};
use prcard_infrastructure::{DisabledLlmGateway, HttpLlmGateway};
use tracing::info;

use crate::api_config::{ApiConfig, LlmProviderConfig};

pub(super) fn build_llm_gateway(config: &ApiConfig) -> AppResult<Arc<dyn LlmGateway>> {
    match &config.llm_provider {
        LlmProviderConfig::Disabled => {
            info!("language model provider disabled");
            Ok(Arc::new(DisabledLlmGateway::new()))
        }
        LlmProviderConfig::Http(http) => {
            let http_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(http.timeout_seconds))
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build language model client: {error}"))
                })?;
            info!(base_url = %http.base_url, model = %http.model, "using HTTP language model provider");

            Ok(Arc::new(HttpLlmGateway::new(
                http_client,
                http.base_url.as_str(),
                http.api_key.clone(),
                http.model.clone(),
            )))
        }
    }
}
