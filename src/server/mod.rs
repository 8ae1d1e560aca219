//! HTTP server module
//!
//! Serves the classification API: service info, health, the browser
//! upload form and the authenticated `/predict` endpoint.

mod api;
mod error;
mod handlers;
mod state;
pub mod upload;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::inference::InferenceConfig;
use crate::security::SecurityConfig;

/// Default request body limit (16 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size: usize,
    pub inference: InferenceConfig,
    pub security: SecurityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
            inference: InferenceConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        model = %config.inference.model_path.display(),
        started_at = %start_time.to_rfc3339(),
        "Initializing application state"
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let max_upload_size = config.max_upload_size;

    // Hashing the fallback password and optimizing the model are CPU bound
    let state = tokio::task::spawn_blocking(move || AppState::from_config(config)).await??;
    if !state.model_loaded() {
        warn!("Serving in degraded mode: /predict will answer 500 until the model is available");
    }
    let app = create_router(Arc::new(state));

    info!(
        address = %addr,
        max_upload_size_mb = max_upload_size / 1024 / 1024,
        "CIFAR-10 classification server starting"
    );
    info!(url = %format!("http://{}/predict", addr), "Upload form available");
    info!(url = %format!("http://{}/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
