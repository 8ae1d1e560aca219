//! Inference module
//!
//! Provides image classification on top of a pre-trained CIFAR-10 network:
//! - ONNX model loading and execution via tract
//! - A `Classifier` seam so the engine can run any backend
//! - Arg-max reporting with the full probability distribution
//! - Optional softmax for exports that emit logits
//! - Lock-free request and latency counters

mod classifier;
mod config;
mod engine;
mod labels;
mod report;

pub use classifier::{Classifier, OnnxClassifier};
pub use config::{InferenceConfig, DEFAULT_MODEL_PATH};
pub use engine::{InferenceEngine, InferenceStats};
pub use labels::{ClassLabels, CIFAR10_LABELS};
pub use report::{argmax, softmax, Prediction, Probabilities};
