use prcard_core::{AppResult, BoundedString};
use serde::{Deserialize, Serialize};

/// Longest accepted chat message, in characters.
pub const MESSAGE_MAX_CHARS: usize = 4000;

/// Longest accepted field id or label, in characters.
pub const FIELD_REFERENCE_MAX_CHARS: usize = 200;

/// Shortest and longest accepted language name, in characters.
pub const USER_LANGUAGE_CHARS: (usize, usize) = (2, 50);

/// A question about one form field, asked in the user's language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    message: BoundedString,
    selected_field_id: BoundedString,
    selected_field_label: BoundedString,
    user_language: BoundedString,
}

impl ChatRequest {
    /// Creates a validated chat request.
    pub fn new(
        message: impl Into<String>,
        selected_field_id: impl Into<String>,
        selected_field_label: impl Into<String>,
        user_language: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            message: BoundedString::new("message", message, 1, MESSAGE_MAX_CHARS)?,
            selected_field_id: BoundedString::new(
                "selected_field_id",
                selected_field_id,
                1,
                FIELD_REFERENCE_MAX_CHARS,
            )?,
            selected_field_label: BoundedString::new(
                "selected_field_label",
                selected_field_label,
                1,
                FIELD_REFERENCE_MAX_CHARS,
            )?,
            user_language: BoundedString::new(
                "user_language",
                user_language,
                USER_LANGUAGE_CHARS.0,
                USER_LANGUAGE_CHARS.1,
            )?,
        })
    }

    /// Raw user message, before sanitization.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Form field id the question is about.
    #[must_use]
    pub fn selected_field_id(&self) -> &str {
        self.selected_field_id.as_str()
    }

    /// Human readable label of the selected field.
    #[must_use]
    pub fn selected_field_label(&self) -> &str {
        self.selected_field_label.as_str()
    }

    /// Language the user writes in.
    #[must_use]
    pub fn user_language(&self) -> &str {
        self.user_language.as_str()
    }
}

/// Assistant answer for one chat request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Answer shown to the user.
    pub assistant_answer: String,
    /// English value proposed for the selected field, empty when none.
    pub suggested_fill_en: String,
    /// Sensitivity and service warnings, sanitizer warnings first.
    pub warnings: Vec<String>,
}

impl ChatReply {
    /// Reply sent instead of an answer when the caller is throttled.
    #[must_use]
    pub fn rate_limited(retry_hint: &str) -> Self {
        Self {
            assistant_answer: String::new(),
            suggested_fill_en: String::new(),
            warnings: vec![retry_hint.to_owned()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ChatRequest;

    #[test]
    fn chat_request_enforces_length_bounds() {
        assert!(ChatRequest::new("How do I fill this?", "name", "Full name", "English").is_ok());
        assert!(ChatRequest::new("", "name", "Full name", "English").is_err());
        assert!(ChatRequest::new("hi", "name", "Full name", "e").is_err());
        assert!(ChatRequest::new("hi", "x".repeat(201), "Full name", "English").is_err());
        assert!(ChatRequest::new("x".repeat(4000), "name", "Full name", "English").is_ok());
    }
}
