//! HTTP detector tests against a mock detection service.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartcrop_detector_client::{DetectorClientConfig, DetectorError, HttpFaceDetector};
use smartcrop_media::{FaceProvider, MediaError, SampledFrame};

fn detector(server: &MockServer) -> HttpFaceDetector {
    HttpFaceDetector::new(DetectorClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_millis(500),
        max_retries: 2,
        retry_base_delay: Duration::from_millis(5),
    })
    .unwrap()
}

fn one_face() -> serde_json::Value {
    json!({
        "detections": [{
            "x": 800.0, "y": 300.0, "w": 240.0, "h": 260.0, "c": 0.91,
            "l": [860.0, 380.0, 980.0, 380.0, 920.0, 440.0, 870.0, 500.0, 970.0, 500.0]
        }],
        "inference_ms": 4.2
    })
}

#[tokio::test]
async fn test_detect_posts_jpeg() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_face()))
        .expect(1)
        .mount(&server)
        .await;

    let faces = detector(&server).detect_jpeg(b"\xff\xd8\xff").await.unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].confidence, 0.91);
    assert!(faces[0].usable_landmarks().is_some());
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model loading"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_face()))
        .mount(&server)
        .await;

    let faces = detector(&server).detect_jpeg(b"jpeg").await.unwrap();
    assert_eq!(faces.len(), 1);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(400).set_body_string("not a jpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let err = detector(&server).detect_jpeg(b"png").await.unwrap_err();
    assert!(matches!(err, DetectorError::RequestFailed { status: 400, .. }));
}

#[tokio::test]
async fn test_retries_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = detector(&server).detect_jpeg(b"jpeg").await.unwrap_err();
    assert!(matches!(err, DetectorError::ServerError { status: 502, .. }));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(one_face())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let detector = HttpFaceDetector::new(DetectorClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_millis(100),
        max_retries: 0,
        retry_base_delay: Duration::from_millis(5),
    })
    .unwrap();

    let err = detector.detect_jpeg(b"jpeg").await.unwrap_err();
    assert!(matches!(err, DetectorError::Timeout(100)));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    assert!(detector(&server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_unhealthy_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!detector(&server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_provider_reads_frame_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detections": []})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let frame_path = dir.path().join("frame_000001.jpg");
    std::fs::write(&frame_path, b"\xff\xd8\xff\xd9").unwrap();

    let provider = detector(&server);
    let faces = provider
        .detect(&SampledFrame::new(0, 0.0, &frame_path))
        .await
        .unwrap();
    assert!(faces.is_empty());
    assert_eq!(provider.name(), "http");
}

#[tokio::test]
async fn test_provider_maps_failures_to_detection_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let frame_path = dir.path().join("frame_000003.jpg");
    std::fs::write(&frame_path, b"jpeg").unwrap();

    let err = detector(&server)
        .detect(&SampledFrame::new(2, 2.0, &frame_path))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::DetectionUnavailable(_)));
    assert!(err.to_string().contains("frame 2"));
}
