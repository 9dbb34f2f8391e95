mod common;

use common::{test_config, ProviderUrls, TestApp};
use storefront_service::startup::Application;

#[tokio::test]
async fn health_check_over_tcp() {
    // Arrange
    let app = Application::build(test_config(&ProviderUrls::default()))
        .await
        .expect("Failed to build application");
    let port = app.port();
    tokio::spawn(app.run_until_stopped());

    // Act
    let response = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "storefront-service-test");
}

#[tokio::test]
async fn readiness_reports_store_up() {
    let app = TestApp::new();

    let response = app.get("/ready", None).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(
        response.headers.get("x-content-type-options").map(|v| v.as_bytes()),
        Some(&b"nosniff"[..])
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();

    let response = app.get("/.well-known/openapi.json", None).await;

    assert_eq!(response.status, 200);
    assert!(response.body["paths"]["/api/orders/razorpay/create"].is_object());
    assert!(response.body["components"]["securitySchemes"]["bearer_auth"].is_object());
}
