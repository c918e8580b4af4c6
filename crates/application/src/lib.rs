//! Application services and ports.

#![forbid(unsafe_code)]

mod chat_service;
mod pdf_form_service;
mod rate_limit_service;
mod sanitizer;

pub use chat_service::{
    ChatService, LlmGateway, PromptMessage, PromptRole, SYSTEM_INSTRUCTION, default_prompt,
    parse_reply,
};
pub use pdf_form_service::{PdfFormEngine, PdfFormService, SourceDocumentStore};
pub use rate_limit_service::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};
pub use sanitizer::{REDACTION_TOKEN, SanitizedText, sanitize};
