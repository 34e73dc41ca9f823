//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use sensor_core::logic::history::LogError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Nothing has been scored since startup
    #[error("no reading yet")]
    NoReading,

    #[error("{0}")]
    NotFound(String),

    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("invalid request: {0}")]
    ValidationError(String),

    #[error("append log: {0}")]
    Log(#[from] LogError),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NoReading => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "No data received from sensor yet" })),
            )
                .into_response(),

            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),

            AppError::UnsupportedMediaType => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type").into_response()
            }

            AppError::ValidationError(msg) => json_error(StatusCode::BAD_REQUEST, &msg),

            AppError::Log(err) => {
                tracing::error!("Append log error: {}", err);
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not read sensor history")
            }

            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "error": message,
        "status": status.as_u16()
    }));
    (status, body).into_response()
}
