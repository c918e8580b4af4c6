use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use prcard_core::AppResult;
use prcard_domain::{ChatReply, ChatRequest};

/// Instruction sent ahead of every user turn.
pub const SYSTEM_INSTRUCTION: &str = "You help people fill in the Canadian permanent resident \
card application (IMM 5444). Answer in the user's language about the selected form field only. \
Never ask for or repeat identity numbers, card numbers or passport numbers. Reply with a JSON \
object holding \"assistant_answer\" (string, user's language), \"suggested_fill_en\" (string, \
English value for the field or empty) and \"warnings\" (array of strings).";

/// Author of one prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    /// Fixed instruction.
    System,
    /// Request payload.
    User,
}

/// One message of a chat completion prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    /// Message author.
    pub role: PromptRole,
    /// Message text.
    pub content: String,
}

/// Port for the language model behind the chat endpoint.
///
/// Adapters normally implement only [`LlmGateway::invoke`]; prompt assembly
/// and reply parsing have shared default implementations.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Builds the prompt for a sanitized request.
    fn build_prompt(
        &self,
        request: &ChatRequest,
        sanitized_message: &str,
        warnings: &[String],
    ) -> Vec<PromptMessage> {
        default_prompt(request, sanitized_message, warnings)
    }

    /// Sends the prompt to the model and returns its raw text output.
    async fn invoke(&self, messages: &[PromptMessage]) -> AppResult<String>;

    /// Turns raw model output into a reply, merging sanitizer warnings first.
    fn parse_response(&self, raw: &str, sanitizer_warnings: &[String]) -> ChatReply {
        parse_reply(raw, sanitizer_warnings)
    }
}

/// System instruction plus one JSON-encoded user turn.
#[must_use]
pub fn default_prompt(
    request: &ChatRequest,
    sanitized_message: &str,
    warnings: &[String],
) -> Vec<PromptMessage> {
    let user_turn = serde_json::json!({
        "field_id": request.selected_field_id(),
        "field_label": request.selected_field_label(),
        "user_language": request.user_language(),
        "message": sanitized_message,
        "sensitivity_warnings": warnings,
    });

    vec![
        PromptMessage {
            role: PromptRole::System,
            content: SYSTEM_INSTRUCTION.to_owned(),
        },
        PromptMessage {
            role: PromptRole::User,
            content: user_turn.to_string(),
        },
    ]
}

/// Decodes a JSON object reply, falling back to the raw text as the answer.
#[must_use]
pub fn parse_reply(raw: &str, sanitizer_warnings: &[String]) -> ChatReply {
    let mut warnings = sanitizer_warnings.to_vec();

    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw.trim()) else {
        return ChatReply {
            assistant_answer: raw.to_owned(),
            suggested_fill_en: String::new(),
            warnings,
        };
    };

    let string_field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    if let Some(model_warnings) = object.get("warnings").and_then(Value::as_array) {
        warnings.extend(
            model_warnings
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned),
        );
    }

    ChatReply {
        assistant_answer: string_field("assistant_answer"),
        suggested_fill_en: string_field("suggested_fill_en"),
        warnings,
    }
}
