//! Latest reading handlers

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};

use sensor_core::ScoredRecord;

use crate::{AppError, AppResult, AppState};

pub const RECEIVED_TEXT: &str = "Data received by server!";

/// Most recent scored reading
pub async fn latest(State(state): State<AppState>) -> AppResult<Json<ScoredRecord>> {
    let record = state.pipeline.latest.get().ok_or(AppError::NoReading)?;
    Ok(Json(record.as_ref().clone()))
}

/// Pushed readings are acknowledged and logged only.
///
/// Scoring and storage happen on the ingestion path; a record posted here
/// (including the forwarder's own pushes) does not touch the latest state
/// or the append log.
pub async fn receive(headers: HeaderMap, body: Bytes) -> AppResult<&'static str> {
    if !is_json(&headers) {
        return Err(AppError::UnsupportedMediaType);
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid JSON body: {}", e)))?;

    tracing::info!(%payload, "Data received");
    Ok(RECEIVED_TEXT)
}

/// `application/json`, parameters such as charset allowed
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}
