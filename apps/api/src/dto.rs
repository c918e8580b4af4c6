use std::collections::BTreeMap;

use prcard_core::{AppError, AppResult};
use prcard_domain::{
    ChatReply, ChatRequest, FieldValues, Language, PageMeta, StampItem, StampOverlay,
    parse_field_values,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../bindings/health-response.ts")]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of a landing page language.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../bindings/language-response.ts")]
pub struct LanguageResponse {
    pub code: String,
    pub label: String,
    pub flag: String,
    pub text: String,
}

impl From<&Language> for LanguageResponse {
    fn from(value: &Language) -> Self {
        Self {
            code: value.code.to_owned(),
            label: value.label.to_owned(),
            flag: value.flag.to_owned(),
            text: value.text.to_owned(),
        }
    }
}

/// Language catalog payload.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../bindings/languages-response.ts")]
pub struct LanguagesResponse {
    pub default_code: String,
    pub languages: Vec<LanguageResponse>,
}

/// Incoming payload for filling the PR card form.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../../../bindings/fill-pr-card-pdf-request.ts")]
pub struct FillPrCardPdfRequest {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub flatten: bool,
}

impl FillPrCardPdfRequest {
    pub fn field_values(&self) -> FieldValues {
        field_values(&self.fields)
    }
}

/// Page size in pixels as rendered by the browser.
#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[ts(export, export_to = "../../../bindings/page-meta-request.ts")]
pub struct PageMetaRequest {
    pub width: f64,
    pub height: f64,
}

/// One free-text stamp positioned in browser pixels.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../../../bindings/stamp-item-request.ts")]
pub struct StampItemRequest {
    pub page: usize,
    pub x_px: f64,
    pub y_px: f64,
    pub height_px: f64,
    pub text: String,
}

/// Incoming payload for filling and stamping the PR card form.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../../../bindings/stamp-pr-card-pdf-request.ts")]
pub struct StampPrCardPdfRequest {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub pages: Vec<PageMetaRequest>,
    #[serde(default)]
    pub stamps: Vec<StampItemRequest>,
    #[serde(default)]
    pub flatten: bool,
}

impl StampPrCardPdfRequest {
    pub fn field_values(&self) -> FieldValues {
        field_values(&self.fields)
    }

    pub fn overlay(&self) -> AppResult<StampOverlay> {
        let pages = self
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                PageMeta::new(page.width, page.height).map_err(|error| {
                    AppError::Validation(format!("pages[{index}]: {error}"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        let stamps = self
            .stamps
            .iter()
            .enumerate()
            .map(|(index, stamp)| {
                StampItem::new(
                    stamp.page,
                    stamp.x_px,
                    stamp.y_px,
                    stamp.height_px,
                    stamp.text.clone(),
                )
                .map_err(|error| AppError::Validation(format!("stamps[{index}]: {error}")))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(StampOverlay::new(pages, stamps))
    }
}

fn field_values(fields: &BTreeMap<String, String>) -> FieldValues {
    parse_field_values(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    )
}

/// Incoming payload for the field assistant chat.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../bindings/chat-request.ts")]
pub struct ChatRequestBody {
    pub message: String,
    pub selected_field_id: String,
    pub selected_field_label: String,
    pub user_language: String,
}

impl TryFrom<ChatRequestBody> for ChatRequest {
    type Error = AppError;

    fn try_from(value: ChatRequestBody) -> Result<Self, Self::Error> {
        ChatRequest::new(
            value.message,
            value.selected_field_id,
            value.selected_field_label,
            value.user_language,
        )
    }
}

/// Assistant reply payload, also used for throttled requests.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../bindings/chat-response.ts")]
pub struct ChatResponse {
    pub assistant_answer: String,
    pub suggested_fill_en: String,
    pub warnings: Vec<String>,
}

impl From<ChatReply> for ChatResponse {
    fn from(value: ChatReply) -> Self {
        Self {
            assistant_answer: value.assistant_answer,
            suggested_fill_en: value.suggested_fill_en,
            warnings: value.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use prcard_domain::FieldValue;

    use super::{FillPrCardPdfRequest, StampPrCardPdfRequest};

    #[test]
    fn omitted_request_members_default_to_empty() {
        let request = serde_json::from_str::<StampPrCardPdfRequest>("{}");

        let request = request.unwrap_or_default();
        assert!(request.fields.is_empty());
        assert!(request.pages.is_empty());
        assert!(request.stamps.is_empty());
        assert!(!request.flatten);
    }

    #[test]
    fn slash_values_become_pdf_names() {
        let request = serde_json::from_str::<FillPrCardPdfRequest>(
            r#"{"fields":{"Page1[0].Married[0]":"/1","Page1[0].Name[0]":"Jane"},"flatten":true}"#,
        )
        .unwrap_or_default();

        let values = request.field_values();
        assert!(request.flatten);
        assert_eq!(
            values.get("Page1[0].Married[0]"),
            Some(&FieldValue::Name("1".to_owned()))
        );
        assert_eq!(
            values.get("Page1[0].Name[0]"),
            Some(&FieldValue::Text("Jane".to_owned()))
        );
    }

    #[test]
    fn invalid_page_size_names_the_offending_entry() {
        let request = serde_json::from_str::<StampPrCardPdfRequest>(
            r#"{"pages":[{"width":800,"height":1000},{"width":0,"height":1000}]}"#,
        )
        .unwrap_or_default();

        let message = request.overlay().err().map(|error| error.to_string());
        assert!(message.is_some_and(|message| message.contains("pages[1]")));
    }

    #[test]
    fn negative_page_index_is_rejected_by_deserialization() {
        let request = serde_json::from_str::<StampPrCardPdfRequest>(
            r#"{"stamps":[{"page":-1,"x_px":1,"y_px":1,"height_px":1,"text":"x"}]}"#,
        );

        assert!(request.is_err());
    }
}
