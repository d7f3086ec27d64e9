//! Newsletter sign-up.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (ym-cli migrate)
//! - The storefront server running (cargo run -p yemeni-market-storefront)

use reqwest::StatusCode;
use serde_json::{Value, json};

use yemeni_market_integration_tests::{TestContext, unique_email};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_subscribe_then_resubscribe() {
    let ctx = TestContext::new();
    let email = unique_email();

    let resp = ctx
        .post("/api/newsletter")
        .json(&json!({ "email": email, "gdpr_consent": true, "lang": "en" }))
        .send()
        .await
        .expect("subscribe");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Subscribed successfully");

    // Same address with different casing is the same subscriber
    let resp = ctx
        .post("/api/newsletter")
        .json(&json!({ "email": email.to_uppercase(), "gdpr_consent": true }))
        .send()
        .await
        .expect("resubscribe");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["message"], "Already subscribed!");
    assert!(body.get("success").is_none());

    let pool = ctx.pool().await;
    let langs: Vec<String> =
        sqlx::query_scalar("SELECT lang FROM newsletter_subscribers WHERE email = $1")
            .bind(&email)
            .fetch_all(&pool)
            .await
            .expect("subscriber rows");
    assert_eq!(langs, ["en"]);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_subscribe_requires_consent() {
    let ctx = TestContext::new();

    for body in [
        json!({ "email": unique_email() }),
        json!({ "email": unique_email(), "gdpr_consent": false }),
        json!({ "gdpr_consent": true }),
    ] {
        let resp = ctx
            .post("/api/newsletter")
            .json(&body)
            .send()
            .await
            .expect("subscribe");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.expect("json");
        assert_eq!(body["error"], "Email and GDPR consent are required");
    }
}
