mod common;

use base64::{Engine as _, engine::general_purpose};
use common::{spawn_app, test_config};
use plant_analysis_service::config::{AnalysisConfig, VisionBackend};
use reqwest::multipart;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/models/gemini-2.5-flash:generateContent";

/// Point the Gemini backend at a local mock server.
fn gemini_config(api_base: String) -> AnalysisConfig {
    let mut config = test_config();
    config.vision.backend = VisionBackend::Gemini;
    config.gemini.model = "gemini-2.5-flash".to_string();
    config.gemini.api_base = api_base;
    config
}

fn png_bytes() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        4,
        4,
        image::Rgb([34, 139, 34]),
    ));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}

fn image_form(bytes: Vec<u8>, mime: &str) -> multipart::Form {
    multipart::Form::new().part(
        "image",
        multipart::Part::bytes(bytes)
            .file_name("plant.png")
            .mime_str(mime)
            .unwrap(),
    )
}

async fn mount_gemini_reply(server: &MockServer, reply: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": reply }]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn analyze_returns_result_and_echoes_image() {
    let mock_server = MockServer::start().await;
    mount_gemini_reply(&mock_server, "Looks like a healthy Boston fern.", 1).await;

    let address = spawn_app(gemini_config(mock_server.uri())).await;
    let image_bytes = png_bytes();

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(image_form(image_bytes.clone(), "image/png"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["result"], "Looks like a healthy Boston fern.");

    // The image comes back as a data URI wrapping the exact uploaded bytes.
    let expected_b64 = general_purpose::STANDARD.encode(&image_bytes);
    assert_eq!(
        body["image"],
        format!("data:image/png;base64,{}", expected_b64)
    );
    let payload = body["image"]
        .as_str()
        .unwrap()
        .split_once(";base64,")
        .unwrap()
        .1
        .to_string();
    assert_eq!(
        general_purpose::STANDARD.decode(payload).unwrap(),
        image_bytes
    );

    // Upstream got the instruction prompt first, then the inline image.
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let parts = &sent["contents"][0]["parts"];
    assert!(parts[0]["text"]
        .as_str()
        .unwrap()
        .contains("species, health, and care recommendations"));
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[1]["inlineData"]["data"], expected_b64);
}

#[tokio::test]
async fn analyze_echo_is_deterministic() {
    let mock_server = MockServer::start().await;
    mount_gemini_reply(&mock_server, "Same plant, same verdict.", 2).await;

    let address = spawn_app(gemini_config(mock_server.uri())).await;
    let image_bytes = b"not really a jpeg but echoed all the same".to_vec();
    let client = reqwest::Client::new();

    let mut echoes = Vec::new();
    for _ in 0..2 {
        let response = client
            .post(format!("{}/analyze", address))
            .multipart(image_form(image_bytes.clone(), "image/jpeg"))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(200, response.status().as_u16());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        echoes.push(body["image"].as_str().unwrap().to_string());
    }

    assert_eq!(echoes[0], echoes[1]);
    assert!(echoes[0].starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn analyze_without_image_field_returns_400() {
    let address = spawn_app(test_config()).await;

    let form = multipart::Form::new().text("note", "no file attached");
    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "error": "No image uploaded" }));
}

#[tokio::test]
async fn analyze_with_empty_file_returns_400() {
    let address = spawn_app(test_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(image_form(Vec::new(), "image/png"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "error": "No image uploaded" }));
}

#[tokio::test]
async fn analyze_rejects_oversized_uploads() {
    let mut config = test_config();
    config.limits.max_image_bytes = 16;
    let address = spawn_app(config).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(image_form(vec![0u8; 64], "image/png"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Image too large"));
}

#[tokio::test]
async fn analyze_with_non_multipart_body_returns_400() {
    let address = spawn_app(test_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .json(&json!({ "note": "not a multipart form" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "error": "No image uploaded" }));
}

#[tokio::test]
async fn analyze_maps_upstream_failure_to_fixed_500() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let address = spawn_app(gemini_config(mock_server.uri())).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(image_form(png_bytes(), "image/png"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(500, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "error": "Error analyzing image" }));
}

#[tokio::test]
async fn analyze_maps_upstream_timeout_to_fixed_500() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": "too late" }] },
                        "finishReason": "STOP"
                    }]
                }))
                .set_delay(Duration::from_secs(5)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = gemini_config(mock_server.uri());
    config.gemini.timeout_secs = 1;
    let address = spawn_app(config).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(image_form(png_bytes(), "image/png"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(500, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "error": "Error analyzing image" }));
}

#[tokio::test]
async fn analyze_maps_rate_limiting_to_fixed_500() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let address = spawn_app(gemini_config(mock_server.uri())).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(image_form(png_bytes(), "image/png"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(500, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "error": "Error analyzing image" }));
}

#[tokio::test]
async fn analyze_works_with_mock_backend() {
    let address = spawn_app(test_config()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/analyze", address))
        .multipart(image_form(png_bytes(), "image/png"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["result"].as_str().unwrap().contains("Mock analysis"));
    assert!(body["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}
