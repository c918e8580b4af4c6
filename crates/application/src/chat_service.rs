//! Chat ports and application service.

mod ports;
mod service;

#[cfg(test)]
mod tests;

pub use ports::{
    LlmGateway, PromptMessage, PromptRole, SYSTEM_INSTRUCTION, default_prompt, parse_reply,
};
pub use service::ChatService;
