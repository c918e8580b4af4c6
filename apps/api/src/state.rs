use prcard_application::{ChatService, PdfFormService, RateLimitRule, RateLimitService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pdf_form_service: PdfFormService,
    pub chat_service: ChatService,
    pub rate_limit_service: RateLimitService,
    pub chat_rate_limit_rule: RateLimitRule,
}
