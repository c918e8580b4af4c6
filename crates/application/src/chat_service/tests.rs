use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use prcard_core::{AppError, AppResult};
use prcard_domain::ChatRequest;

use super::{ChatService, LlmGateway, PromptMessage, PromptRole, parse_reply};

struct RecordingGateway {
    response: AppResult<String>,
    prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl RecordingGateway {
    fn answering(response: &str) -> Self {
        Self {
            response: Ok(response.to_owned()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmGateway for RecordingGateway {
    async fn invoke(&self, messages: &[PromptMessage]) -> AppResult<String> {
        self.prompts.lock().await.push(messages.to_vec());
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(error) => Err(AppError::Internal(error.to_string())),
        }
    }
}

fn request(message: &str) -> ChatRequest {
    ChatRequest::new(message, "family_name", "Family name", "Francais")
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn prompt_carries_sanitized_message_and_warnings() {
    let gateway = Arc::new(RecordingGateway::answering(
        r#"{"assistant_answer":"Ecrivez votre nom.","suggested_fill_en":"DOE","warnings":[]}"#,
    ));
    let service = ChatService::new(gateway.clone());

    let reply = service
        .reply(&request("<b>My SIN is 123-45-6789</b>"))
        .await;
    assert!(reply.is_ok());

    let prompts = gateway.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert_eq!(prompt.len(), 2);
    assert_eq!(prompt[0].role, PromptRole::System);
    assert_eq!(prompt[1].role, PromptRole::User);

    let user_turn: Value =
        serde_json::from_str(&prompt[1].content).unwrap_or_else(|_| unreachable!());
    assert_eq!(user_turn["field_id"], "family_name");
    assert_eq!(user_turn["field_label"], "Family name");
    assert_eq!(user_turn["user_language"], "Francais");
    assert_eq!(user_turn["message"], "My SIN is [redacted]");
    assert_eq!(user_turn["sensitivity_warnings"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn reply_merges_sanitizer_warnings_before_model_warnings() {
    let gateway = Arc::new(RecordingGateway::answering(
        r#"{"assistant_answer":"ok","suggested_fill_en":"","warnings":["check spelling"]}"#,
    ));
    let service = ChatService::new(gateway);

    let reply = service
        .reply(&request("passport AB1234567"))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(reply.assistant_answer, "ok");
    assert_eq!(reply.warnings.len(), 2);
    assert!(reply.warnings[0].contains("passport"));
    assert_eq!(reply.warnings[1], "check spelling");
}

#[tokio::test]
async fn gateway_failure_propagates() {
    let gateway = Arc::new(RecordingGateway {
        response: Err(AppError::Internal("model offline".to_owned())),
        prompts: Mutex::new(Vec::new()),
    });
    let service = ChatService::new(gateway);

    let reply = service.reply(&request("hello")).await;
    assert!(matches!(reply, Err(AppError::Internal(_))));
}

#[test]
fn non_json_output_becomes_the_answer() {
    let warnings = vec!["Possible SIN detected and masked before processing.".to_owned()];

    let reply = parse_reply("Just write your name.", &warnings);

    assert_eq!(reply.assistant_answer, "Just write your name.");
    assert!(reply.suggested_fill_en.is_empty());
    assert_eq!(reply.warnings, warnings);
}

#[test]
fn json_that_is_not_an_object_falls_back_to_raw_text() {
    let reply = parse_reply(r#"["a","b"]"#, &[]);

    assert_eq!(reply.assistant_answer, r#"["a","b"]"#);
    assert!(reply.warnings.is_empty());
}

#[test]
fn missing_or_mistyped_keys_default_to_empty() {
    let reply = parse_reply(r#"{"assistant_answer":42,"warnings":["w",7]}"#, &[]);

    assert!(reply.assistant_answer.is_empty());
    assert!(reply.suggested_fill_en.is_empty());
    assert_eq!(reply.warnings, vec!["w".to_owned()]);
}
