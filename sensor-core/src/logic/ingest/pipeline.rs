//! Ingestion loop
//!
//! read frame → decode → score → {latest state, append log, forwarder}
//!
//! A bad frame is logged and dropped without touching shared state. A line
//! longer than `MAX_FRAME_BYTES` is never buffered whole; it counts as a
//! malformed frame. The loop ends only when the stream closes or the read
//! fails.

use std::io::{self, BufRead, Read};
use std::thread;
use std::time::Duration;

use super::IngestError;
use crate::constants;
use crate::logic::context::PipelineContext;
use crate::logic::features::ScoredRecord;
use crate::logic::forward::DownstreamSink;
use crate::logic::frame::{DecodeError, DecodeErrorKind, FrameDecoder};
use crate::logic::history::AppendOutcome;
use crate::logic::model::Scorer;

// ============================================================================
// TYPES
// ============================================================================

/// How long to wait for the downstream sink before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: constants::DEFAULT_READY_RETRIES,
            backoff: Duration::from_millis(constants::DEFAULT_READY_BACKOFF_MS),
        }
    }
}

impl ReadinessPolicy {
    pub fn from_env() -> Self {
        Self {
            attempts: constants::get_ready_retries(),
            backoff: constants::get_ready_backoff(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingDownstreamReady,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    StreamClosed,
    ReadFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub reason: StopReason,
    /// Non-empty lines read
    pub frames: u64,
}

// ============================================================================
// LOOP
// ============================================================================

pub struct IngestionLoop<S: Scorer> {
    scorer: S,
    decoder: FrameDecoder,
    context: PipelineContext,
    sink: Option<Box<dyn DownstreamSink>>,
    readiness: ReadinessPolicy,
    state: LoopState,
}

impl<S: Scorer> IngestionLoop<S> {
    pub fn new(scorer: S, context: PipelineContext) -> Self {
        Self {
            scorer,
            decoder: FrameDecoder::default(),
            context,
            sink: None,
            readiness: ReadinessPolicy::default(),
            state: LoopState::AwaitingDownstreamReady,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn DownstreamSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Wait for readiness, then consume `reader` until it closes
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<LoopSummary, IngestError> {
        self.await_ready()?;
        Ok(self.consume(reader))
    }

    /// Poll the sink with backoff. No sink means ready.
    pub fn await_ready(&mut self) -> Result<(), IngestError> {
        self.state = LoopState::AwaitingDownstreamReady;

        if let Some(sink) = self.sink.as_deref() {
            let attempts = self.readiness.attempts.max(1);
            let mut ready = false;

            for attempt in 1..=attempts {
                if sink.is_ready() {
                    log::info!("Downstream ready after {} attempt(s)", attempt);
                    ready = true;
                    break;
                }
                log::info!("Waiting for downstream ({}/{})", attempt, attempts);
                if attempt < attempts {
                    thread::sleep(self.readiness.backoff);
                }
            }

            if !ready {
                self.state = LoopState::Stopped;
                log::error!("Downstream never became ready, not reading the stream");
                return Err(IngestError::DownstreamNeverReady { attempts });
            }
        }

        self.state = LoopState::Running;
        Ok(())
    }

    fn consume<R: BufRead>(&mut self, mut reader: R) -> LoopSummary {
        log::info!("Ingestion loop running");

        let mut buf = Vec::with_capacity(256);
        let mut frames = 0u64;

        let reason = loop {
            buf.clear();
            let limit = constants::MAX_FRAME_BYTES as u64;
            match (&mut reader).take(limit).read_until(b'\n', &mut buf) {
                Ok(0) => break StopReason::StreamClosed,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break StopReason::ReadFailed(e.to_string()),
            }

            if buf.len() >= constants::MAX_FRAME_BYTES && buf.last() != Some(&b'\n') {
                frames += 1;
                self.context.stats.frame_read();
                self.drop_oversized(&buf);
                if let Err(e) = skip_line(&mut reader) {
                    break StopReason::ReadFailed(e.to_string());
                }
                continue;
            }

            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            frames += 1;
            self.context.stats.frame_read();
            self.process_frame(&buf);
        };

        self.state = LoopState::Stopped;
        match &reason {
            StopReason::StreamClosed => log::info!("Frame stream closed after {} frames", frames),
            StopReason::ReadFailed(e) => log::error!("Frame stream read failed after {} frames: {}", frames, e),
        }

        LoopSummary { reason, frames }
    }

    fn drop_oversized(&self, head: &[u8]) {
        self.context.stats.decode_failed(DecodeErrorKind::Malformed);
        let shown = &head[..head.len().min(64)];
        let e = DecodeError::MalformedFrame {
            reason: format!("longer than {} bytes", constants::MAX_FRAME_BYTES),
            raw: format!("{}...", String::from_utf8_lossy(shown)),
        };
        log::warn!("Dropping frame: {}", e);
    }

    /// Handle one raw line. Returns the scored record if it was accepted.
    pub fn process_frame(&self, line: &[u8]) -> Option<ScoredRecord> {
        let stats = &self.context.stats;

        let reading = match self.decoder.decode(line) {
            Ok(reading) => reading,
            Err(e) => {
                stats.decode_failed(e.kind());
                log::warn!("Dropping frame: {}", e);
                return None;
            }
        };

        let scored = self.scorer.score(&reading);
        stats.scored(scored.anomaly);
        if scored.anomaly {
            log::warn!(
                "Anomaly: T={} H={} G={} score={:?}",
                reading.temperature,
                reading.humidity,
                reading.gas,
                scored.score
            );
        } else {
            log::debug!(
                "Normal: T={} H={} G={} score={:?}",
                reading.temperature,
                reading.humidity,
                reading.gas,
                scored.score
            );
        }

        self.context.latest.set(scored.clone());

        match self.context.log.append(&scored.reading, scored.anomaly) {
            Ok(AppendOutcome::Appended(_)) => stats.log_appended(),
            Ok(AppendOutcome::Skipped { .. }) => {
                stats.log_duplicate();
                log::debug!("Same values as last row, not logged");
            }
            Err(e) => {
                stats.log_failed();
                log::error!("Append log write failed: {}", e);
            }
        }

        if let Some(sink) = self.sink.as_deref() {
            sink.forward(&scored);
        }

        Some(scored)
    }
}

/// Discard the rest of the current line without buffering it
fn skip_line<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let (found, used) = match reader.fill_buf() {
            Ok(available) if available.is_empty() => return Ok(()),
            Ok(available) => match available.iter().position(|b| *b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, available.len()),
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        reader.consume(used);
        if found {
            return Ok(());
        }
    }
}
