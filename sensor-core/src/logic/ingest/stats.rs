//! Pipeline counters
//!
//! Monotonic, lock-free. Written by the ingestion loop and the forwarder
//! worker, read by the status endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::logic::frame::DecodeErrorKind;

#[derive(Debug, Default)]
pub struct IngestStats {
    frames_read: AtomicU64,
    decode_malformed: AtomicU64,
    decode_incomplete: AtomicU64,
    decode_type_mismatch: AtomicU64,
    records_scored: AtomicU64,
    anomalies: AtomicU64,
    log_appends: AtomicU64,
    log_duplicates: AtomicU64,
    log_failures: AtomicU64,
    forwards_queued: AtomicU64,
    forwards_dropped: AtomicU64,
    forwards_sent: AtomicU64,
    forward_failures: AtomicU64,
}

/// Point-in-time copy for serialization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub frames_read: u64,
    pub decode_malformed: u64,
    pub decode_incomplete: u64,
    pub decode_type_mismatch: u64,
    pub records_scored: u64,
    pub anomalies: u64,
    pub log_appends: u64,
    pub log_duplicates: u64,
    pub log_failures: u64,
    pub forwards_queued: u64,
    pub forwards_dropped: u64,
    pub forwards_sent: u64,
    pub forward_failures: u64,
}

impl StatsSnapshot {
    pub fn decode_failures(&self) -> u64 {
        self.decode_malformed + self.decode_incomplete + self.decode_type_mismatch
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_read(&self) {
        bump(&self.frames_read);
    }

    pub fn decode_failed(&self, kind: DecodeErrorKind) {
        match kind {
            DecodeErrorKind::Malformed => bump(&self.decode_malformed),
            DecodeErrorKind::Incomplete => bump(&self.decode_incomplete),
            DecodeErrorKind::TypeMismatch => bump(&self.decode_type_mismatch),
        }
    }

    pub fn scored(&self, anomaly: bool) {
        bump(&self.records_scored);
        if anomaly {
            bump(&self.anomalies);
        }
    }

    pub fn log_appended(&self) {
        bump(&self.log_appends);
    }

    pub fn log_duplicate(&self) {
        bump(&self.log_duplicates);
    }

    pub fn log_failed(&self) {
        bump(&self.log_failures);
    }

    pub fn forward_queued(&self) {
        bump(&self.forwards_queued);
    }

    pub fn forward_dropped(&self) {
        bump(&self.forwards_dropped);
    }

    pub fn forward_sent(&self) {
        bump(&self.forwards_sent);
    }

    pub fn forward_failed(&self) {
        bump(&self.forward_failures);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            frames_read: load(&self.frames_read),
            decode_malformed: load(&self.decode_malformed),
            decode_incomplete: load(&self.decode_incomplete),
            decode_type_mismatch: load(&self.decode_type_mismatch),
            records_scored: load(&self.records_scored),
            anomalies: load(&self.anomalies),
            log_appends: load(&self.log_appends),
            log_duplicates: load(&self.log_duplicates),
            log_failures: load(&self.log_failures),
            forwards_queued: load(&self.forwards_queued),
            forwards_dropped: load(&self.forwards_dropped),
            forwards_sent: load(&self.forwards_sent),
            forward_failures: load(&self.forward_failures),
        }
    }
}
