//! Language model gateway used when no provider is configured.

use async_trait::async_trait;
use prcard_application::{LlmGateway, PromptMessage};
use prcard_core::AppResult;
use tracing::debug;

/// Gateway that answers every prompt with a fixed "assistant disabled" reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLlmGateway;

impl DisabledLlmGateway {
    /// Creates a new disabled gateway.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmGateway for DisabledLlmGateway {
    async fn invoke(&self, messages: &[PromptMessage]) -> AppResult<String> {
        debug!(
            message_count = messages.len(),
            "language model disabled, returning canned reply"
        );

        Ok(serde_json::json!({
            "assistant_answer": "The assistant is not configured on this server. \
                Use the field help text and the official IMM 5444 instruction guide.",
            "suggested_fill_en": "",
            "warnings": ["AI assistance is disabled."],
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use prcard_application::{LlmGateway, PromptMessage, PromptRole};

    use super::DisabledLlmGateway;

    #[tokio::test]
    async fn canned_reply_parses_into_a_chat_reply() {
        let gateway = DisabledLlmGateway::new();
        let messages = [PromptMessage {
            role: PromptRole::User,
            content: "hello".to_owned(),
        }];

        let raw = gateway.invoke(&messages).await.unwrap_or_default();
        let reply = gateway.parse_response(&raw, &["masked".to_owned()]);

        assert!(reply.assistant_answer.contains("not configured"));
        assert!(reply.suggested_fill_en.is_empty());
        assert_eq!(
            reply.warnings,
            vec!["masked".to_owned(), "AI assistance is disabled.".to_owned()]
        );
    }
}
