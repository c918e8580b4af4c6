use std::sync::Arc;

use prcard_application::{ChatService, PdfFormService};
use prcard_core::AppError;
use prcard_infrastructure::{FileSourceDocumentStore, LopdfFormEngine};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod gateways;
mod rate_limits;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let source_document_path = config.source_document_path();
    info!(path = %source_document_path.display(), "using PR card source form");

    let pdf_form_service = PdfFormService::new(
        Arc::new(FileSourceDocumentStore::new(source_document_path)),
        Arc::new(LopdfFormEngine::new()),
    );
    let chat_service = ChatService::new(gateways::build_llm_gateway(config)?);
    let rate_limit_service = rate_limits::build_rate_limit_service(config)?;

    Ok(AppState {
        pdf_form_service,
        chat_service,
        rate_limit_service,
        chat_rate_limit_rule: config.chat_rate_limit_rule(),
    })
}
