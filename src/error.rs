//! Error types for the classification pipeline

use thiserror::Error;

/// Result type alias for classification operations
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Errors raised while loading the model or classifying an image
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Unable to open image file: {0}")]
    ImageDecode(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl From<image::ImageError> for ClassifierError {
    fn from(err: image::ImageError) -> Self {
        ClassifierError::ImageDecode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_errors_become_decode_failures() {
        let err: ClassifierError = image::load_from_memory(b"not an image").unwrap_err().into();
        assert!(matches!(err, ClassifierError::ImageDecode(_)));
        assert!(err.to_string().starts_with("Unable to open image file"));
    }
}
