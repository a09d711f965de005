use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Rejects a value outside the closed unit interval (NaN included)
pub(crate) fn ensure_unit_interval(field: &str, value: f64) -> AppResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "{} must be between 0 and 1, got {}",
            field, value
        )))
    }
}
