//! Application state management

use std::sync::Arc;
use tracing::{error, info};

use crate::inference::InferenceEngine;
use crate::security::{CredentialError, CredentialStore, CredentialTable};

use super::ServerConfig;

/// Read-only context shared by every request handler
pub struct AppState {
    pub config: ServerConfig,
    /// `None` when the model failed to load at startup
    pub engine: Option<Arc<InferenceEngine>>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        engine: Option<Arc<InferenceEngine>>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            engine,
            credentials,
        }
    }

    /// Load credentials and the model described by `config`.
    ///
    /// A model that fails to load leaves the state degraded instead of
    /// failing: info and health routes keep working while `/predict`
    /// answers 500. Credential errors are fatal.
    pub fn from_config(config: ServerConfig) -> Result<Self, CredentialError> {
        let credentials = CredentialTable::from_config(&config.security)?;

        let engine = match InferenceEngine::load(config.inference.clone()) {
            Ok(engine) => Some(Arc::new(engine)),
            Err(e) => {
                error!(
                    error = %e,
                    model = %config.inference.model_path.display(),
                    expected_format = "onnx",
                    "Failed to load model, /predict will be unavailable"
                );
                None
            }
        };

        info!(
            model_loaded = engine.is_some(),
            users = credentials.len(),
            "Application state ready"
        );

        Ok(Self::new(config, engine, Arc::new(credentials)))
    }

    pub fn model_loaded(&self) -> bool {
        self.engine.is_some()
    }
}
