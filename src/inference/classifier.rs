//! Classifier backends

use ndarray::Array4;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

use super::InferenceConfig;
use crate::error::{ClassifierError, Result};
use crate::preprocessing::CHANNELS;

/// A loaded model that maps a single-image batch to class scores.
///
/// Implementations are shared read-only between concurrent requests, so a
/// forward pass must only need `&self`.
pub trait Classifier: Send + Sync {
    /// Run the forward pass over a `(1, height, width, 3)` batch
    fn forward(&self, batch: &Array4<f32>) -> Result<Vec<f32>>;

    /// Number of scores per image, when the backend knows it up front
    fn output_len(&self) -> Option<usize> {
        None
    }

    /// Short human-readable description used in logs
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX model executed with tract
pub struct OnnxClassifier {
    plan: OnnxPlan,
    path: PathBuf,
    output_len: Option<usize>,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("path", &self.path)
            .field("output_len", &self.output_len)
            .finish()
    }
}

impl OnnxClassifier {
    /// Load and optimize the model at `config.model_path`, pinning its input
    /// to `(1, input_size, input_size, 3)` f32.
    pub fn load(config: &InferenceConfig) -> Result<Self> {
        let path = config.model_path.as_path();
        if !path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model file not found at {}{}",
                path.display(),
                format_hint(path)
            )));
        }

        let size = config.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| {
                m.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, size, size, CHANNELS)),
                )
            })
            .and_then(|m| m.into_optimized())
            .map_err(|e| load_error(path, e))?;

        let output_len = model
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|dims| dims.iter().product::<usize>()));

        let plan = model.into_runnable().map_err(|e| load_error(path, e))?;

        Ok(Self {
            plan,
            path: path.to_path_buf(),
            output_len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_error(path: &Path, err: TractError) -> ClassifierError {
    ClassifierError::ModelLoad(format!("{}: {}{}", path.display(), err, format_hint(path)))
}

/// Extra context for paths that do not look like an ONNX export
fn format_hint(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("onnx") => "",
        _ => " (expected an ONNX model; convert Keras .h5 checkpoints to ONNX first)",
    }
}

impl Classifier for OnnxClassifier {
    fn forward(&self, batch: &Array4<f32>) -> Result<Vec<f32>> {
        let data = batch.as_slice().ok_or_else(|| {
            ClassifierError::Inference("input tensor is not contiguous".to_string())
        })?;
        let input = Tensor::from_shape(batch.shape(), data)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let scores = outputs
            .first()
            .ok_or_else(|| ClassifierError::Inference("model produced no outputs".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        Ok(scores.iter().copied().collect())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.path.display())
    }
}
