//! Inference configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::preprocessing::INPUT_SIZE;

/// Default location of the exported classifier
pub const DEFAULT_MODEL_PATH: &str = "cifar10_mobilenet_final.onnx";

/// Configuration for model loading and inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Path to the ONNX model artifact
    pub model_path: PathBuf,

    /// Square input resolution the model was trained on
    pub input_size: u32,

    /// Apply softmax to the raw output (for exports that emit logits)
    pub apply_softmax: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            input_size: INPUT_SIZE,
            apply_softmax: std::env::var("APPLY_SOFTMAX")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

impl InferenceConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn with_softmax(mut self, enabled: bool) -> Self {
        self.apply_softmax = enabled;
        self
    }
}
