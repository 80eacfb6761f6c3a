//! Readiness polling against a real HTTP server

use inferprobe_http::{HttpConfig, RequestExecutor, ReqwestExecutor};
use inferprobe_resilience::wait_until_ready;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor() -> Arc<dyn RequestExecutor> {
    Arc::new(ReqwestExecutor::new(&HttpConfig::default()).unwrap())
}

#[tokio::test]
async fn test_ready_after_service_warms_up() {
    let server = MockServer::start().await;

    // First three calls fail, then the service is healthy
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "device": "cpu",
            "cuda_available": false,
            "rocm_available": false
        })))
        .mount(&server)
        .await;

    let result = wait_until_ready(
        executor(),
        &format!("{}/health", server.uri()),
        5,
        Duration::from_millis(10),
        Duration::from_secs(2),
    )
    .await;

    assert!(result.ready);
    assert_eq!(result.attempts_used, 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_exhausted_sends_exactly_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = wait_until_ready(
        executor(),
        &format!("{}/health", server.uri()),
        3,
        Duration::from_millis(10),
        Duration::from_secs(2),
    )
    .await;

    assert!(!result.ready);
    assert_eq!(result.attempts_used, 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert!(result.into_result().is_err());
}
