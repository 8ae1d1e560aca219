//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Html,
    Json,
};
use tracing::{info, warn};

use crate::inference::{Prediction, CIFAR10_LABELS};

use super::error::{Result, ServerError};
use super::state::AppState;
use super::upload::PredictForm;

// ============================================================================
// Info Handlers
// ============================================================================

/// Describe the API and the labels it can predict
pub async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "CIFAR-10 Image Classification API",
        "description": "API for classifying images into one of ten CIFAR-10 classes",
        "endpoints": {
            "/predict": "POST - Submit an image for classification (requires authentication)",
            "/health": "GET - Check API health status",
            "/stats": "GET - Inference counters",
        },
        "classes": CIFAR10_LABELS,
    }))
}

/// Liveness only; reports healthy whether or not the model loaded
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "model": "CIFAR-10 classifier",
    }))
}

pub async fn inference_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.engine.as_ref().map(|e| e.stats()).unwrap_or_default();
    Json(serde_json::json!({
        "model_loaded": state.model_loaded(),
        "total_requests": stats.total_requests,
        "successful": stats.successful,
        "failed": stats.failed,
        "avg_latency_ms": stats.avg_latency_ms,
    }))
}

// ============================================================================
// Prediction Handlers
// ============================================================================

pub async fn predict_form() -> Html<&'static str> {
    Html(UPLOAD_FORM_HTML)
}

/// Authenticate, validate the upload and classify it.
///
/// Checks run in order and the first failure wins: model loaded,
/// credentials, image present, filename, decode, inference.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>> {
    let engine = state.engine.clone().ok_or(ServerError::ModelUnavailable)?;
    let form = PredictForm::from_multipart(multipart?).await?;

    let (username, password) = form.credentials();
    let credentials = Arc::clone(&state.credentials);
    let user = username.clone();
    let authorized = tokio::task::spawn_blocking(move || credentials.verify(&user, &password))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    if !authorized {
        warn!(username = %username, "Rejected prediction request with invalid credentials");
        return Err(ServerError::InvalidCredentials);
    }

    let upload = form.into_image()?;
    info!(
        username = %username,
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "Classifying upload"
    );

    let prediction = tokio::task::spawn_blocking(move || engine.classify(&upload.bytes))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    info!(
        class = %prediction.class,
        confidence = prediction.confidence,
        "Prediction complete"
    );
    Ok(Json(prediction))
}

const UPLOAD_FORM_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>CIFAR-10 Image Classifier</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 32rem; margin: 3rem auto; padding: 0 1rem; color: #222; }
        label { display: block; margin-top: 1rem; font-weight: 600; }
        input { width: 100%; padding: .4rem; margin-top: .25rem; box-sizing: border-box; }
        button { margin-top: 1.5rem; padding: .5rem 1.25rem; }
        pre { background: #f4f4f4; padding: 1rem; overflow-x: auto; }
    </style>
</head>
<body>
    <h1>CIFAR-10 Image Classifier</h1>
    <p>Upload a PNG, JPEG or GIF image to classify it as one of:
       airplane, automobile, bird, cat, deer, dog, frog, horse, ship, truck.</p>
    <form id="predict-form" action="/predict" method="post" enctype="multipart/form-data">
        <label for="username">Username</label>
        <input type="text" id="username" name="username" required>
        <label for="password">Password</label>
        <input type="password" id="password" name="password" required>
        <label for="image">Image</label>
        <input type="file" id="image" name="image" accept=".png,.jpg,.jpeg,.gif" required>
        <button type="submit">Classify</button>
    </form>
    <pre id="result" hidden></pre>
    <script>
        document.getElementById('predict-form').addEventListener('submit', async (event) => {
            event.preventDefault();
            const result = document.getElementById('result');
            const response = await fetch('/predict', { method: 'POST', body: new FormData(event.target) });
            result.textContent = JSON.stringify(await response.json(), null, 2);
            result.hidden = false;
        });
    </script>
</body>
</html>
"#;
