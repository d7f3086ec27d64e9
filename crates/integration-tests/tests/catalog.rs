//! Catalog browsing, reviews and wishlist.

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use yemeni_market_integration_tests::{TestContext, money};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_price_filter_and_sort() {
    let ctx = TestContext::new();

    let products: Vec<Value> = ctx
        .get("/api/products?min_price=10&max_price=100&sort=price_asc")
        .send()
        .await
        .expect("products")
        .json()
        .await
        .expect("json");

    let prices: Vec<_> = products.iter().map(|p| money(&p["price"])).collect();
    assert!(prices.iter().all(|p| *p >= Decimal::TEN && *p <= Decimal::ONE_HUNDRED));
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    assert!(products.iter().all(|p| p["is_active"] == true));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_product_detail_and_unknown_product() {
    let ctx = TestContext::new();
    let product = ctx.product_in_stock(0).await;
    let id = product["id"].as_i64().expect("id");

    let resp = ctx.get(&format!("/api/products/{id}")).send().await.expect("detail");
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: Value = resp.json().await.expect("json");
    assert_eq!(detail["id"], id);
    assert!(detail["variants"].is_array());
    assert!(detail["reviews"].is_array());

    let resp = ctx.get("/api/products/99999999").send().await.expect("detail");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = ctx.get("/api/products/honey").send().await.expect("detail");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_review_without_purchase_is_unverified() {
    let ctx = TestContext::new();
    let customer = ctx.customer().await;
    let product = ctx.product_in_stock(0).await;
    let id = product["id"].as_i64().expect("id");

    let resp = ctx
        .post(&format!("/api/products/{id}/reviews"))
        .bearer_auth(&customer.token)
        .json(&json!({ "rating": 5, "comment": "Wonderful honey" }))
        .send()
        .await
        .expect("review");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let review: Value = resp.json().await.expect("json");
    assert_eq!(review["is_verified"], false);

    let resp = ctx
        .post(&format!("/api/products/{id}/reviews"))
        .bearer_auth(&customer.token)
        .json(&json!({ "rating": 0 }))
        .send()
        .await
        .expect("review");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wishlist_toggle() {
    let ctx = TestContext::new();
    let customer = ctx.customer().await;
    let product = ctx.product_in_stock(0).await;
    let id = product["id"].as_i64().expect("id");

    let toggle = || {
        ctx.post("/api/wishlist/toggle")
            .bearer_auth(&customer.token)
            .json(&json!({ "productId": id }))
            .send()
    };

    let body: Value = toggle().await.expect("toggle").json().await.expect("json");
    assert_eq!(body["added"], true);

    let list: Vec<Value> = ctx
        .get("/api/wishlist")
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("wishlist")
        .json()
        .await
        .expect("json");
    assert!(list.iter().any(|p| p["id"] == id));

    let body: Value = toggle().await.expect("toggle").json().await.expect("json");
    assert_eq!(body["added"], false);

    let resp = ctx
        .post("/api/wishlist/toggle")
        .bearer_auth(&customer.token)
        .json(&json!({}))
        .send()
        .await
        .expect("toggle");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
