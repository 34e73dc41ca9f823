//! Sensor Pipeline Server
//!
//! One process, three duties:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     SENSOR PIPELINE                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐    ┌──────────────┐    ┌──────────────────┐ │
//! │  │  Ingestion  │───▶│  Pipeline    │◀───│  Control Plane   │ │
//! │  │  (thread)   │    │  Context     │    │  (Axum)          │ │
//! │  └──────┬──────┘    └──────────────┘    └──────────────────┘ │
//! │         ▼                                                    │
//! │  ┌─────────────┐                                             │
//! │  │  Forwarder  │  (thread, best effort)                      │
//! │  └─────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;


use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use tokio::sync::oneshot;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensor_core::logic::forward::HttpForwarder;
use sensor_core::logic::history::AppendLog;
use sensor_core::logic::ingest::{IngestError, IngestionLoop, LoopSummary};
use sensor_core::logic::model::{InferenceEngine, ModelInfo};
use sensor_core::PipelineContext;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensor_server=debug,sensor_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Sensor pipeline server starting...");
    tracing::info!("Frame source: {}", config.frame_source);
    tracing::info!("Append log: {}", config.log_path.display());

    // Everything below is fatal on failure
    let engine = InferenceEngine::load(&config.artifacts).context("loading model artifacts")?;
    let model = Arc::new(engine.info().clone());

    let log = AppendLog::open(&config.log_path)
        .with_context(|| format!("opening append log {}", config.log_path.display()))?;
    let pipeline = PipelineContext::new(log);

    let stream = config.frame_source.open().context("opening frame stream")?;

    let state = AppState {
        pipeline: pipeline.clone(),
        model,
    };
    let app = create_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    // Ingestion starts after the listener is bound: the default forward
    // target is this server.
    let mut ingest = IngestionLoop::new(engine, pipeline.clone()).with_readiness(config.readiness);
    match config.forward() {
        Some(forward) => {
            let forwarder = HttpForwarder::spawn(forward, Arc::clone(&pipeline.stats))?;
            ingest = ingest.with_sink(Box::new(forwarder));
        }
        None => tracing::info!("Forwarding disabled"),
    }

    let (done_tx, done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("ingest".to_string())
        .spawn(move || {
            let _ = done_tx.send(ingest.run(stream));
        })
        .context("spawning ingestion thread")?;

    let (fatal_tx, mut fatal_rx) = oneshot::channel();
    let shutdown = async move {
        tokio::select! {
            _ = ctrl_c() => {}
            err = ingestion_failure(done_rx) => {
                tracing::error!("Ingestion could not start: {}", err);
                let _ = fatal_tx.send(err);
            }
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serving HTTP")?;

    pipeline.log.flush().context("flushing append log")?;
    tracing::info!("Server stopped");

    if let Ok(err) = fatal_rx.try_recv() {
        return Err(anyhow::Error::new(err).context("ingestion aborted"));
    }
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: PipelineContext,
    pub model: Arc<ModelInfo>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::check))
        .route(
            "/receive_data",
            get(handlers::readings::latest).post(handlers::readings::receive),
        )
        .route("/csv_data", get(handlers::history::csv))
        .route("/status", get(handlers::status::status))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => {
            tracing::error!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Resolves only on a fatal ingestion result. A closed stream leaves the
/// control plane serving what was collected.
async fn ingestion_failure(done: oneshot::Receiver<Result<LoopSummary, IngestError>>) -> IngestError {
    match done.await {
        Ok(Err(err)) => return err,
        Ok(Ok(summary)) => {
            tracing::warn!("Ingestion stopped ({:?}, {} frames)", summary.reason, summary.frames);
        }
        Err(_) => tracing::error!("Ingestion thread exited without a result"),
    }
    std::future::pending().await
}
