//! Pipeline status handler

use axum::{extract::State, Json};
use serde::Serialize;

use sensor_core::constants::APP_VERSION;
use sensor_core::logic::ingest::StatsSnapshot;
use sensor_core::logic::model::ModelInfo;

use crate::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    version: &'static str,
    model: ModelInfo,
    stats: StatsSnapshot,
    latest_available: bool,
    log_path: String,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: APP_VERSION,
        model: state.model.as_ref().clone(),
        stats: state.pipeline.stats.snapshot(),
        latest_available: !state.pipeline.latest.is_empty(),
        log_path: state.pipeline.log.path().display().to_string(),
    })
}
