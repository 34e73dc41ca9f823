//! History handler

use std::sync::Arc;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use crate::{AppError, AppResult, AppState};

/// Raw append log as text/csv
pub async fn csv(State(state): State<AppState>) -> AppResult<Response> {
    let log = Arc::clone(&state.pipeline.log);
    let bytes = tokio::task::spawn_blocking(move || log.read_raw())
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))??;

    match bytes {
        Some(bytes) => Ok(([(CONTENT_TYPE, "text/csv")], bytes).into_response()),
        None => Err(AppError::NotFound("CSV file not found".to_string())),
    }
}
