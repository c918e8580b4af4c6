use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderValue;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use prcard_domain::PdfFieldSet;

use crate::dto::{FillPrCardPdfRequest, StampPrCardPdfRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::json_payload;

const FILLED_DISPOSITION: &str = "attachment; filename=\"IMM5444E-filled.pdf\"";
const STAMPED_DISPOSITION: &str = "attachment; filename=\"IMM5444E-stamped.pdf\"";

pub async fn pr_card_pdf_fields_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<PdfFieldSet>> {
    state
        .pdf_form_service
        .list_fields()
        .await
        .map(Json)
        .map_err(Into::into)
}

pub async fn fill_pr_card_pdf_handler(
    State(state): State<AppState>,
    payload: Result<Json<FillPrCardPdfRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let payload = json_payload(payload)?;

    let document = state
        .pdf_form_service
        .fill_fields(&payload.field_values(), payload.flatten)
        .await?;

    Ok(pdf_response(document, FILLED_DISPOSITION))
}

pub async fn stamp_pr_card_pdf_handler(
    State(state): State<AppState>,
    payload: Result<Json<StampPrCardPdfRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let payload = json_payload(payload)?;
    let overlay = payload.overlay()?;

    let document = state
        .pdf_form_service
        .stamp_overlay(&payload.field_values(), &overlay, payload.flatten)
        .await?;

    Ok(pdf_response(document, STAMPED_DISPOSITION))
}

fn pdf_response(document: Vec<u8>, disposition: &'static str) -> Response {
    (
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (CONTENT_DISPOSITION, HeaderValue::from_static(disposition)),
        ],
        document,
    )
        .into_response()
}
