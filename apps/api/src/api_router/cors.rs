use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use prcard_core::AppError;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Builds the browser CORS policy. `frontend_urls` may list several
/// comma-separated origins.
pub(super) fn build_cors_layer(frontend_urls: &str) -> Result<CorsLayer, AppError> {
    let origins = frontend_urls
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|error| {
                AppError::Validation(format!("invalid FRONTEND_URL origin '{origin}': {error}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(AppError::Validation(
            "FRONTEND_URL must name at least one origin".to_owned(),
        ));
    }

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]))
}
