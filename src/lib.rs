//! cifar10-serve - HTTP image classification for a CIFAR-10 model
//!
//! Accepts an uploaded image, runs it through a pre-trained classifier and
//! returns the predicted label together with the full probability
//! distribution.
//!
//! # Modules
//!
//! - [`preprocessing`] - Decode, resize and scale images into model input
//! - [`inference`] - Model loading, forward pass and prediction reports
//! - [`security`] - Salted password hashes and credential lookup
//! - [`server`] - HTTP API with request validation
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Pipeline
pub mod preprocessing;
pub mod inference;

// Services
pub mod security;
pub mod server;
pub mod cli;

pub use error::{ClassifierError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ClassifierError, Result};
    pub use crate::inference::{Classifier, InferenceConfig, InferenceEngine, Prediction};
    pub use crate::preprocessing::ImageNormalizer;
    pub use crate::security::{CredentialStore, CredentialTable};
    pub use crate::server::{create_router, AppState, ServerConfig};
}
