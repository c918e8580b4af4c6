//! OpenAI-compatible chat completion gateway.

use async_trait::async_trait;
use prcard_application::{LlmGateway, PromptMessage};
use prcard_core::{AppError, AppResult};
use serde::Deserialize;
use tracing::warn;

const RESPONSE_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP gateway for any service exposing `POST {base}/chat/completions`.
pub struct HttpLlmGateway {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpLlmGateway {
    /// Creates a gateway for the given API base URL and model.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl LlmGateway for HttpLlmGateway {
    async fn invoke(&self, messages: &[PromptMessage]) -> AppResult<String> {
        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": RESPONSE_TEMPERATURE,
                "response_format": { "type": "json_object" },
            }));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|error| {
            AppError::Internal(format!("language model transport error: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            warn!(%status, "language model request failed");
            return Err(AppError::Internal(format!(
                "language model request failed with status {status}: {body}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|error| {
            AppError::Internal(format!("invalid language model response: {error}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::Internal("language model response had no message content".to_owned())
            })
    }
}
