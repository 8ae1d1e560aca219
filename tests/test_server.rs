//! Integration test: Server API endpoints and the /predict request gate

use cifar10_serve::inference::{softmax, Classifier, InferenceConfig, InferenceEngine, CIFAR10_LABELS};
use cifar10_serve::security::{CredentialTable, SecurityConfig};
use cifar10_serve::server::{create_router, AppState, ServerConfig};
use cifar10_serve::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::Array4;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "cifar10-test-boundary";
const TEST_ROUNDS: u32 = 1_000;

/// Scores every class from the mean brightness of the input
struct BrightnessClassifier;

impl Classifier for BrightnessClassifier {
    fn forward(&self, batch: &Array4<f32>) -> Result<Vec<f32>> {
        assert_eq!(batch.shape(), &[1, 32, 32, 3]);
        let mean = batch.mean().unwrap_or(0.0);
        let logits: Vec<f32> = (0..10).map(|i| -((i as f32 / 9.0) - mean).powi(2) * 10.0).collect();
        Ok(softmax(&logits))
    }

    fn output_len(&self) -> Option<usize> {
        Some(10)
    }
}

fn test_config(max_upload_size: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_upload_size,
        inference: InferenceConfig::new("unused.onnx"),
        security: SecurityConfig {
            credentials_file: None,
            admin_password: "password123".to_string(),
            hash_rounds: TEST_ROUNDS,
        },
    }
}

fn build_app(with_model: bool, max_upload_size: usize) -> (axum::Router, Arc<AppState>) {
    let config = test_config(max_upload_size);
    let engine = with_model.then(|| {
        Arc::new(InferenceEngine::with_classifier(
            config.inference.clone(),
            Arc::new(BrightnessClassifier),
        ))
    });
    let credentials = CredentialTable::with_user("admin", "password123", TEST_ROUNDS);
    let state = Arc::new(AppState::new(config, engine, Arc::new(credentials)));
    (create_router(state.clone()), state)
}

fn test_app() -> axum::Router {
    build_app(true, 16 * 1024 * 1024).0
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value).as_bytes(),
                );
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn predict_request(parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn encoded_image(w: u32, h: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(color)))
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

fn encoded_gif(w: u32, h: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255])))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Gif)
        .unwrap();
    buf
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Info, health and form
// ============================================================================

#[tokio::test]
async fn test_api_info_lists_classes() {
    let (status, json) = send(test_app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "CIFAR-10 Image Classification API");
    assert!(json["endpoints"]["/predict"].is_string());
    assert!(json["endpoints"]["/health"].is_string());

    let classes: Vec<&str> = json["classes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(classes, CIFAR10_LABELS);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, json) = send(test_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "healthy", "model": "CIFAR-10 classifier"}));
}

#[tokio::test]
async fn test_health_ignores_missing_model() {
    let (app, _) = build_app(false, 16 * 1024 * 1024);
    let (status, json) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_predict_get_serves_html_form() {
    let response = test_app().oneshot(get("/predict")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("name=\"image\""));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (status, json) = send(test_app(), get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/predict")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// Successful predictions
// ============================================================================

#[tokio::test]
async fn test_predict_success_shape() {
    let png = encoded_image(64, 48, [200, 30, 30], ImageFormat::Png);
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::File("image", "photo.png", &png),
    ]);
    let (status, json) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::OK, "body: {}", json);

    let class = json["class"].as_str().unwrap();
    let index = json["class_index"].as_u64().unwrap() as usize;
    let confidence = json["confidence"].as_f64().unwrap();
    assert!(CIFAR10_LABELS.contains(&class));
    assert_eq!(CIFAR10_LABELS[index], class);
    assert!((0.0..=1.0).contains(&confidence));

    let probs = json["all_probabilities"].as_object().unwrap();
    assert_eq!(probs.len(), 10);
    let total: f64 = probs.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-4, "probabilities sum to {}", total);
    assert!((probs[class].as_f64().unwrap() - confidence).abs() < 1e-9);
}

#[tokio::test]
async fn test_predict_any_size_and_format() {
    let cases = [
        (encoded_image(1, 1, [0, 0, 0], ImageFormat::Png), "tiny.PNG"),
        (encoded_image(32, 32, [255, 255, 255], ImageFormat::Png), "native.png"),
        (encoded_image(300, 20, [10, 200, 90], ImageFormat::Jpeg), "wide.jpg"),
        (encoded_image(40, 90, [90, 90, 90], ImageFormat::Jpeg), "tall.JPEG"),
        (encoded_gif(16, 16), "small.gif"),
    ];

    for (bytes, filename) in &cases {
        let request = predict_request(&[
            Part::Text("username", "admin"),
            Part::Text("password", "password123"),
            Part::File("image", filename, bytes),
        ]);
        let (status, json) = send(test_app(), request).await;
        assert_eq!(status, StatusCode::OK, "{} -> {}", filename, json);
        assert!(CIFAR10_LABELS.contains(&json["class"].as_str().unwrap()));
    }
}

#[tokio::test]
async fn test_stats_count_predictions() {
    let (app, state) = build_app(true, 16 * 1024 * 1024);
    let png = encoded_image(8, 8, [5, 5, 5], ImageFormat::Png);
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::File("image", "a.png", &png),
    ]);
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model_loaded"], true);
    assert_eq!(json["total_requests"], 1);
    assert_eq!(json["successful"], 1);
    assert_eq!(state.engine.as_ref().unwrap().stats().successful, 1);
}

// ============================================================================
// Request gate failures
// ============================================================================

#[tokio::test]
async fn test_model_unavailable_checked_first() {
    let (app, _) = build_app(false, 16 * 1024 * 1024);
    let request = predict_request(&[Part::Text("username", "nobody")]);
    let (status, json) = send(app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Model not loaded");
}

#[tokio::test]
async fn test_invalid_credentials_do_not_reveal_field() {
    let png = encoded_image(8, 8, [5, 5, 5], ImageFormat::Png);
    let wrong_password = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "letmein"),
        Part::File("image", "a.png", &png),
    ]);
    let unknown_user = predict_request(&[
        Part::Text("username", "mallory"),
        Part::Text("password", "password123"),
        Part::File("image", "a.png", &png),
    ]);

    let (status_a, json_a) = send(test_app(), wrong_password).await;
    let (status_b, json_b) = send(test_app(), unknown_user).await;
    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    assert_eq!(json_a, json_b);
    assert_eq!(json_a, serde_json::json!({"error": "Invalid credentials"}));
}

#[tokio::test]
async fn test_missing_credentials_are_unauthorized() {
    let png = encoded_image(8, 8, [5, 5, 5], ImageFormat::Png);
    let request = predict_request(&[Part::File("image", "a.png", &png)]);
    let (status, _) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_credentials_checked_before_file() {
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "nope"),
    ]);
    let (status, _) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_image() {
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
    ]);
    let (status, json) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image provided");
}

#[tokio::test]
async fn test_text_field_named_image_is_not_a_file() {
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::Text("image", "cat.png"),
    ]);
    let (status, json) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image provided");
}

#[tokio::test]
async fn test_empty_filename() {
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::File("image", "", b""),
    ]);
    let (status, json) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image selected");
}

#[tokio::test]
async fn test_invalid_file_type() {
    let png = encoded_image(8, 8, [5, 5, 5], ImageFormat::Png);
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::File("image", "foo.txt", &png),
    ]);
    let (status, json) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid file type"));
}

#[tokio::test]
async fn test_corrupted_image_bytes() {
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::File("image", "photo.png", b"\x89PNG but not really an image"),
    ]);
    let (status, json) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unable to open image file");
}

#[tokio::test]
async fn test_not_multipart_is_bad_request_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(test_app(), request).await;
    assert!(status.is_client_error());
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let (app, _) = build_app(true, 1024);
    let big = vec![0u8; 8 * 1024];
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::File("image", "big.png", &big),
    ]);
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_startup_without_model_serves_degraded() {
    let mut config = test_config(16 * 1024 * 1024);
    config.inference = InferenceConfig::new("/nonexistent.onnx");
    let state = AppState::from_config(config).unwrap();
    assert!(!state.model_loaded());
    let app = create_router(Arc::new(state));

    let (status, json) = send(app.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");

    let png = encoded_image(8, 8, [5, 5, 5], ImageFormat::Png);
    let request = predict_request(&[
        Part::Text("username", "admin"),
        Part::Text("password", "password123"),
        Part::File("image", "a.png", &png),
    ]);
    let (status, json) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, serde_json::json!({"error": "Model not loaded"}));

    let (status, json) = send(app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model_loaded"], false);
    assert_eq!(json["total_requests"], 0);
}
