pub mod chat;
pub mod health;
pub mod languages;
pub mod pr_card_pdf;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use prcard_core::AppError;

use crate::error::{ApiError, ApiResult};

/// Unwraps a JSON body, reporting malformed payloads as validation errors.
fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError(AppError::Validation(rejection.body_text())))
}
