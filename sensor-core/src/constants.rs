//! Central Configuration Constants
//!
//! Single source of truth for pipeline defaults.
//! Every value can be overridden from the environment.

use std::time::Duration;

/// Default inbound frame source (Bluetooth serial bridge)
pub const DEFAULT_FRAME_SOURCE: &str = "/dev/rfcomm0";

/// Default append log location
pub const DEFAULT_LOG_PATH: &str = "sensorData.csv";

/// Default scaler artifact
pub const DEFAULT_SCALER_PATH: &str = "scaler.json";

/// Default classifier artifact
pub const DEFAULT_MODEL_PATH: &str = "model.json";

/// Readiness check attempts before ingestion gives up
pub const DEFAULT_READY_RETRIES: u32 = 10;

/// Sleep between failed readiness checks (milliseconds)
pub const DEFAULT_READY_BACKOFF_MS: u64 = 1000;

/// Per-request timeout for downstream forwarding (seconds)
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 5;

/// Capacity of the forwarder queue
pub const DEFAULT_FORWARD_QUEUE: usize = 256;

/// Longest accepted frame, newline included. Longer lines are dropped.
pub const MAX_FRAME_BYTES: usize = 4096;

/// Value of FORWARD_URL that disables forwarding
pub const FORWARD_DISABLED: &str = "off";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get frame source from environment or use default
pub fn get_frame_source() -> String {
    std::env::var("FRAME_SOURCE")
        .unwrap_or_else(|_| DEFAULT_FRAME_SOURCE.to_string())
}

/// Get append log path from environment or use default
pub fn get_log_path() -> String {
    std::env::var("SENSOR_LOG_PATH")
        .unwrap_or_else(|_| DEFAULT_LOG_PATH.to_string())
}

/// Get scaler artifact path from environment or use default
pub fn get_scaler_path() -> String {
    std::env::var("SCALER_PATH")
        .unwrap_or_else(|_| DEFAULT_SCALER_PATH.to_string())
}

/// Get classifier artifact path from environment or use default
pub fn get_model_path() -> String {
    std::env::var("MODEL_PATH")
        .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
}

/// Expected SHA-256 of the scaler artifact, if pinned
pub fn get_scaler_sha256() -> Option<String> {
    std::env::var("SCALER_SHA256").ok().filter(|s| !s.trim().is_empty())
}

/// Expected SHA-256 of the classifier artifact, if pinned
pub fn get_model_sha256() -> Option<String> {
    std::env::var("MODEL_SHA256").ok().filter(|s| !s.trim().is_empty())
}

/// Get readiness retries from environment or use default
pub fn get_ready_retries() -> u32 {
    std::env::var("READY_RETRIES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_READY_RETRIES)
}

/// Get readiness backoff from environment or use default
pub fn get_ready_backoff() -> Duration {
    let ms = std::env::var("READY_BACKOFF_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_READY_BACKOFF_MS);
    Duration::from_millis(ms)
}

/// Get forward timeout from environment or use default
pub fn get_forward_timeout() -> Duration {
    let secs = std::env::var("FORWARD_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FORWARD_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Get forwarder queue capacity from environment or use default
pub fn get_forward_queue() -> usize {
    std::env::var("FORWARD_QUEUE")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_FORWARD_QUEUE)
}

/// Get forward target, `None` when forwarding is disabled.
///
/// Without an explicit FORWARD_URL the records are pushed to this
/// process's own `POST /receive_data` on `port`.
pub fn get_forward_url(port: u16) -> Option<String> {
    match std::env::var("FORWARD_URL") {
        Ok(url) if url.trim().eq_ignore_ascii_case(FORWARD_DISABLED) => None,
        Ok(url) if !url.trim().is_empty() => Some(url.trim().to_string()),
        _ => Some(format!("http://127.0.0.1:{}/receive_data", port)),
    }
}
