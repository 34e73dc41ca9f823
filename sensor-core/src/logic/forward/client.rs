//! HTTP forwarder
//!
//! Readiness is a blocking check (called from the ingestion thread before
//! the stream is read). Records are handed to a worker thread through a
//! bounded queue; the ingestion loop never waits on the network.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;

use super::{DownstreamSink, ForwardError};
use crate::constants;
use crate::logic::features::{ScoredRecord, SensorRecord};
use crate::logic::ingest::IngestStats;

/// Forwarder configuration
#[derive(Debug, Clone)]
pub struct ForwardConfig {
    pub url: String,
    pub timeout: Duration,
    pub queue: usize,
}

impl ForwardConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(constants::DEFAULT_FORWARD_TIMEOUT_SECS),
            queue: constants::DEFAULT_FORWARD_QUEUE,
        }
    }
}

pub struct HttpForwarder {
    config: ForwardConfig,
    tx: mpsc::Sender<SensorRecord>,
    stats: Arc<IngestStats>,
}

impl HttpForwarder {
    /// Start the worker thread
    pub fn spawn(config: ForwardConfig, stats: Arc<IngestStats>) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ForwardError::Setup(e.to_string()))?;

        let (tx, rx) = mpsc::channel(config.queue.max(1));

        let url = config.url.clone();
        let worker_stats = Arc::clone(&stats);
        thread::Builder::new()
            .name("forwarder".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        log::error!("Forwarder runtime failed to start: {}", e);
                        return;
                    }
                };
                rt.block_on(run_worker(client, url, rx, worker_stats));
            })
            .map_err(|e| ForwardError::Setup(e.to_string()))?;

        log::info!(
            "Forwarder started: {} (queue {}, timeout {:?})",
            config.url,
            config.queue,
            config.timeout
        );

        Ok(Self { config, tx, stats })
    }

    fn enqueue(&self, reading: SensorRecord) -> Result<(), ForwardError> {
        self.tx.try_send(reading).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ForwardError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ForwardError::Closed,
        })
    }
}

impl DownstreamSink for HttpForwarder {
    /// 2xx or 404 means something is listening
    fn is_ready(&self) -> bool {
        let response = ureq::get(&self.config.url)
            .timeout(self.config.timeout)
            .call();

        match response {
            Ok(_) => true,
            Err(ureq::Error::Status(404, _)) => true,
            Err(ureq::Error::Status(code, _)) => {
                log::debug!("Downstream {} answered {}", self.config.url, code);
                false
            }
            Err(e) => {
                log::debug!("Downstream {} unreachable: {}", self.config.url, e);
                false
            }
        }
    }

    fn forward(&self, record: &ScoredRecord) {
        match self.enqueue(record.reading) {
            Ok(()) => self.stats.forward_queued(),
            Err(e) => {
                self.stats.forward_dropped();
                log::warn!("Forward dropped: {}", e);
            }
        }
    }
}

async fn run_worker(
    client: reqwest::Client,
    url: String,
    mut rx: mpsc::Receiver<SensorRecord>,
    stats: Arc<IngestStats>,
) {
    while let Some(reading) = rx.recv().await {
        match post(&client, &url, &reading).await {
            Ok(()) => stats.forward_sent(),
            Err(e) => {
                stats.forward_failed();
                log::warn!("{}", e);
            }
        }
    }
    log::info!("Forwarder queue closed, worker exiting");
}

async fn post(client: &reqwest::Client, url: &str, reading: &SensorRecord) -> Result<(), ForwardError> {
    let response = client
        .post(url)
        .json(reading)
        .send()
        .await
        .map_err(|e| ForwardError::Unavailable(e.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(ForwardError::Rejected(response.status().as_u16()))
    }
}
