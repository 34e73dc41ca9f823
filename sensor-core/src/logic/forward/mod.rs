//! Forward Module - best-effort push of scored records
//!
//! Failures here are logged and counted, never surfaced to the ingestion
//! loop.

pub mod client;

pub use client::{ForwardConfig, HttpForwarder};

use crate::logic::features::ScoredRecord;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("downstream unavailable: {0}")]
    Unavailable(String),

    #[error("downstream rejected record with status {0}")]
    Rejected(u16),

    #[error("forward queue full")]
    QueueFull,

    #[error("forwarder stopped")]
    Closed,

    #[error("cannot start forwarder: {0}")]
    Setup(String),
}

/// Where scored records go after they are logged
pub trait DownstreamSink: Send + Sync {
    /// Blocking readiness check
    fn is_ready(&self) -> bool;

    /// Must not block
    fn forward(&self, record: &ScoredRecord);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ingest::IngestStats;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_unreachable_target_is_not_ready() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut config = ForwardConfig::new(format!("http://127.0.0.1:{}/receive_data", port));
        config.timeout = Duration::from_millis(200);

        let forwarder = HttpForwarder::spawn(config, Arc::new(IngestStats::new())).unwrap();
        assert!(!forwarder.is_ready());
    }

    #[test]
    fn test_forward_never_blocks_when_queue_is_full() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut config = ForwardConfig::new(format!("http://127.0.0.1:{}/receive_data", port));
        config.queue = 1;
        config.timeout = Duration::from_millis(200);

        let stats = Arc::new(IngestStats::new());
        let forwarder = HttpForwarder::spawn(config, Arc::clone(&stats)).unwrap();
        let record = crate::logic::model::fixtures::logistic_engine().score_at(
            &crate::logic::features::SensorRecord::new(25.0, 60.0, 100),
            chrono::Local::now().naive_local(),
        );

        for _ in 0..500 {
            forwarder.forward(&record);
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.forwards_queued + snapshot.forwards_dropped, 500);
        assert!(snapshot.forwards_dropped > 0);
    }
}
