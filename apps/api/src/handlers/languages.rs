use axum::Json;
use prcard_domain::{DEFAULT_LANGUAGE_CODE, LANGUAGES};

use crate::dto::{LanguageResponse, LanguagesResponse};

pub async fn languages_handler() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        default_code: DEFAULT_LANGUAGE_CODE.to_owned(),
        languages: LANGUAGES.iter().map(LanguageResponse::from).collect(),
    })
}
