//! Configuration module

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use sensor_core::constants;
use sensor_core::logic::forward::ForwardConfig;
use sensor_core::logic::ingest::{FrameSource, ReadinessPolicy};
use sensor_core::logic::model::ArtifactPaths;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Inbound frame stream
    pub frame_source: FrameSource,

    /// CSV append log
    pub log_path: PathBuf,

    /// Scaler / classifier artifacts and pinned checksums
    pub artifacts: ArtifactPaths,

    /// Downstream target, `None` when forwarding is off
    pub forward_url: Option<String>,

    pub forward_timeout: Duration,
    pub forward_queue: usize,

    pub readiness: ReadinessPolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let mut artifacts = ArtifactPaths::new(constants::get_scaler_path(), constants::get_model_path());
        artifacts.scaler_sha256 = constants::get_scaler_sha256();
        artifacts.model_sha256 = constants::get_model_sha256();

        Self {
            host: env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),

            port,

            frame_source: FrameSource::parse(&constants::get_frame_source()),

            log_path: PathBuf::from(constants::get_log_path()),

            artifacts,

            forward_url: constants::get_forward_url(port),
            forward_timeout: constants::get_forward_timeout(),
            forward_queue: constants::get_forward_queue(),

            readiness: ReadinessPolicy::from_env(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Forwarder settings, if forwarding is enabled
    pub fn forward(&self) -> Option<ForwardConfig> {
        self.forward_url.as_ref().map(|url| ForwardConfig {
            url: url.clone(),
            timeout: self.forward_timeout,
            queue: self.forward_queue,
        })
    }
}
