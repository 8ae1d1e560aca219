//! Inference engine implementation
//!
//! Owns the shared classifier and runs the per-image pipeline:
//! decode and normalize, forward pass, arg-max report. Every call is
//! independent; the only shared mutable state is a set of atomic counters.

use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::classifier::{Classifier, OnnxClassifier};
use super::labels::ClassLabels;
use super::report::{softmax, Prediction};
use super::InferenceConfig;
use crate::error::Result;
use crate::preprocessing::ImageNormalizer;

/// Inference statistics snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InferenceStats {
    pub total_requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Default)]
struct Counters {
    successful: AtomicU64,
    failed: AtomicU64,
    latency_micros: AtomicU64,
}

impl Counters {
    fn record(&self, ok: bool, elapsed: Duration) {
        if ok {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.latency_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> InferenceStats {
        let successful = self.successful.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let total = successful + failed;
        let micros = self.latency_micros.load(Ordering::Relaxed);
        InferenceStats {
            total_requests: total,
            successful,
            failed,
            avg_latency_ms: if total == 0 {
                0.0
            } else {
                micros as f64 / total as f64 / 1000.0
            },
        }
    }
}

/// Image classification engine
pub struct InferenceEngine {
    config: InferenceConfig,
    classifier: Arc<dyn Classifier>,
    normalizer: ImageNormalizer,
    labels: ClassLabels,
    counters: Counters,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("config", &self.config)
            .field("classifier", &self.classifier.describe())
            .field("labels", &self.labels.len())
            .finish()
    }
}

impl InferenceEngine {
    /// Load the ONNX model named by `config`
    pub fn load(config: InferenceConfig) -> Result<Self> {
        let started = Instant::now();
        let classifier = OnnxClassifier::load(&config)?;
        info!(
            model = %config.model_path.display(),
            input_size = config.input_size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model loaded"
        );
        Ok(Self::with_classifier(config, Arc::new(classifier)))
    }

    /// Build an engine around an already loaded classifier
    pub fn with_classifier(config: InferenceConfig, classifier: Arc<dyn Classifier>) -> Self {
        let labels = ClassLabels::cifar10();
        if let Some(n) = classifier.output_len() {
            if n != labels.len() {
                warn!(
                    model_outputs = n,
                    labels = labels.len(),
                    "Model output length does not match the label set; predictions will fail"
                );
            }
        }

        Self {
            normalizer: ImageNormalizer::new(config.input_size, config.input_size),
            config,
            classifier,
            labels,
            counters: Counters::default(),
        }
    }

    /// Classify one encoded image
    pub fn classify(&self, bytes: &[u8]) -> Result<Prediction> {
        let started = Instant::now();
        let result = self.run(bytes);
        let elapsed = started.elapsed();
        self.counters.record(result.is_ok(), elapsed);

        match &result {
            Ok(p) => debug!(
                class = %p.class,
                confidence = p.confidence,
                latency_us = elapsed.as_micros() as u64,
                "Image classified"
            ),
            Err(e) => debug!(error = %e, "Classification failed"),
        }
        result
    }

    /// Classify a tensor that has already been normalized
    pub fn classify_tensor(&self, batch: &Array4<f32>) -> Result<Prediction> {
        let mut scores = self.classifier.forward(batch)?;
        if self.config.apply_softmax {
            scores = softmax(&scores);
        }
        Prediction::from_scores(&scores, &self.labels)
    }

    fn run(&self, bytes: &[u8]) -> Result<Prediction> {
        let batch = self.normalizer.normalize(bytes)?;
        self.classify_tensor(&batch)
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn stats(&self) -> InferenceStats {
        self.counters.snapshot()
    }
}
