//! Domain types and invariants for the PR card assistant.

#![forbid(unsafe_code)]

mod chat;
mod language;
mod pdf_form;
mod stamp;

pub use chat::{
    ChatReply, ChatRequest, FIELD_REFERENCE_MAX_CHARS, MESSAGE_MAX_CHARS, USER_LANGUAGE_CHARS,
};
pub use language::{DEFAULT_LANGUAGE_CODE, LANGUAGES, Language};
pub use pdf_form::{FieldValue, FieldValues, PdfFieldSet, parse_field_values};
pub use stamp::{
    BASELINE_RATIO, FONT_SCALE, MAX_FONT_SIZE_PT, MIN_FONT_SIZE_PT, PageMeta, PageSize, StampItem,
    StampOverlay, StampPlacement,
};
