//! Health checks, diagnostics and the JSON 404.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (ym-cli migrate)
//! - The storefront server running (cargo run -p yemeni-market-storefront)

use reqwest::StatusCode;
use serde_json::Value;

use yemeni_market_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let resp = ctx.get("/health").send().await.expect("health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");

    let resp = ctx.get("/health/ready").send().await.expect("readiness");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_api_diagnostics() {
    let ctx = TestContext::new();

    let resp = ctx.get("/api/test").send().await.expect("api test");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["status"], "success");
    assert!(body["env_check"]["stripe_enabled"].is_boolean());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_unknown_api_route_is_json() {
    let ctx = TestContext::new();

    let resp = ctx.get("/api/does-not-exist").send().await.expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "API route not found");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_public_config_hides_secrets() {
    let ctx = TestContext::new();

    let body: Value = ctx
        .get("/api/config")
        .send()
        .await
        .expect("config")
        .json()
        .await
        .expect("json");

    let config = body.as_object().expect("config is an object");
    assert!(!config.contains_key("stripe_secret_key"));
    assert!(!config.contains_key("smtp_pass"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_request_id_is_echoed() {
    let ctx = TestContext::new();

    let resp = ctx
        .get("/api/test")
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.headers()["x-request-id"], "trace-abc-123");
}
