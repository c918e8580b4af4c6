use axum::Router;
use axum::routing::{get, post};
use prcard_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

mod cors;


pub fn build_router(app_state: AppState, frontend_url: Option<&str>) -> Result<Router, AppError> {
    let router = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/languages",
            get(handlers::languages::languages_handler),
        )
        .route(
            "/api/pr-card-pdf/fields",
            get(handlers::pr_card_pdf::pr_card_pdf_fields_handler),
        )
        .route(
            "/api/pr-card-pdf",
            post(handlers::pr_card_pdf::fill_pr_card_pdf_handler),
        )
        .route(
            "/api/pr-card-pdf-stamp",
            post(handlers::pr_card_pdf::stamp_pr_card_pdf_handler),
        )
        .route("/api/chat", post(handlers::chat::chat_handler))
        .layer(TraceLayer::new_for_http());

    let router = match frontend_url {
        Some(frontend_url) => router.layer(cors::build_cors_layer(frontend_url)?),
        None => router,
    };

    Ok(router.with_state(app_state))
}
