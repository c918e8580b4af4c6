use std::sync::Arc;

use tracing::{debug, warn};

use prcard_core::AppResult;
use prcard_domain::{ChatReply, ChatRequest};

use crate::sanitizer::sanitize;

use super::ports::LlmGateway;

/// Application service answering questions about form fields.
#[derive(Clone)]
pub struct ChatService {
    gateway: Arc<dyn LlmGateway>,
}

impl ChatService {
    /// Creates a chat service from a gateway implementation.
    #[must_use]
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Masks the message, asks the model and parses its reply.
    ///
    /// Rate limiting happens before this call; gateway failures propagate.
    pub async fn reply(&self, request: &ChatRequest) -> AppResult<ChatReply> {
        let sanitized = sanitize(request.message());
        if !sanitized.warnings.is_empty() {
            warn!(
                field_id = request.selected_field_id(),
                masked_categories = sanitized.warnings.len(),
                "masked sensitive content in chat message"
            );
        }

        let prompt = self
            .gateway
            .build_prompt(request, &sanitized.text, &sanitized.warnings);
        let raw = self.gateway.invoke(&prompt).await?;
        debug!(
            field_id = request.selected_field_id(),
            response_chars = raw.chars().count(),
            "language model responded"
        );

        Ok(self.gateway.parse_response(&raw, &sanitized.warnings))
    }
}
