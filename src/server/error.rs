//! Error types for the server

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::ClassifierError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No image provided")]
    MissingFile,

    #[error("No image selected")]
    EmptyFilename,

    #[error("Invalid file type. Only image files are allowed")]
    UnsupportedFileType,

    #[error("Unable to open image file")]
    ImageDecode,

    #[error("{0}")]
    Inference(String),

    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    MultipartRejection(#[from] MultipartRejection),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClassifierError> for ServerError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ImageDecode(detail) => {
                tracing::debug!(detail = %detail, "Upload could not be decoded");
                ServerError::ImageDecode
            }
            other => ServerError::Inference(other.to_string()),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::ModelUnavailable
            | ServerError::Inference(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServerError::MissingFile
            | ServerError::EmptyFilename
            | ServerError::UnsupportedFileType
            | ServerError::ImageDecode => StatusCode::BAD_REQUEST,
            ServerError::Multipart(e) => e.status(),
            ServerError::MultipartRejection(e) => e.status(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Multipart(e) => e.body_text(),
            ServerError::MultipartRejection(e) => e.body_text(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %message, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), detail = %message, "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::ModelUnavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServerError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServerError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::EmptyFilename.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::UnsupportedFileType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::ImageDecode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::Inference("boom".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_classifier_errors_map_to_taxonomy() {
        let decode: ServerError = ClassifierError::ImageDecode("bad magic".into()).into();
        assert!(matches!(decode, ServerError::ImageDecode));
        assert_eq!(decode.to_string(), "Unable to open image file");

        let other: ServerError = ClassifierError::Inference("tensor exploded".into()).into();
        assert!(matches!(other, ServerError::Inference(ref m) if m.contains("tensor exploded")));

        let shape: ServerError = ClassifierError::ShapeError {
            expected: "10 class scores".into(),
            actual: "2 class scores".into(),
        }
        .into();
        assert_eq!(shape.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
