//! Liveness handler

pub const LIVENESS_TEXT: &str = "Sensor Pipeline Server Running";

pub async fn check() -> &'static str {
    LIVENESS_TEXT
}
