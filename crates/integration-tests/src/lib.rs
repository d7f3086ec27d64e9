//! End-to-end tests for the Yemeni Market storefront.
//!
//! # Running Tests
//!
//! ```bash
//! ym-cli migrate && ym-cli seed catalog && ym-cli seed coupon
//! cargo run -p yemeni-market-storefront &
//! cargo test -p yemeni-market-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Server under test (default `http://localhost:5000`)
//! - `STOREFRONT_DATABASE_URL` - Same database the server uses
//! - `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD` - Seeded admin credentials

#![allow(clippy::missing_panics_doc)]

use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Shared handles for one test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("STOREFRONT_TEST_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_owned());
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    /// Connect to the server's database, for checks the API does not expose.
    pub async fn pool(&self) -> PgPool {
        let url = std::env::var("STOREFRONT_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("STOREFRONT_DATABASE_URL must be set");
        PgPool::connect(&url)
            .await
            .expect("Failed to connect to test database")
    }

    /// Register a fresh customer and log in.
    pub async fn customer(&self) -> TestCustomer {
        let email = unique_email();
        let password = "sidr-honey-2026".to_owned();

        let resp = self
            .post("/api/auth/register")
            .json(&json!({ "full_name": "Test Customer", "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED);

        let token = self.login(&email, &password).await;
        TestCustomer {
            email,
            password,
            token,
        }
    }

    /// Log in as the seeded admin.
    pub async fn admin_token(&self) -> String {
        let email = std::env::var("TEST_ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@yemeni.market".to_owned());
        let password =
            std::env::var("TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_owned());
        self.login(&email, &password).await
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), StatusCode::OK, "login failed for {email}");

        let body: Value = resp.json().await.expect("Failed to parse login response");
        body["token"]
            .as_str()
            .expect("login response has no token")
            .to_owned()
    }

    /// Active products with at least `min_stock` units.
    pub async fn products_in_stock(&self, min_stock: i64) -> Vec<Value> {
        let products: Vec<Value> = self
            .get("/api/products")
            .send()
            .await
            .expect("Failed to list products")
            .json()
            .await
            .expect("Failed to parse products");

        products
            .into_iter()
            .filter(|p| p["stock_quantity"].as_i64().unwrap_or(0) >= min_stock)
            .collect()
    }

    /// First active product with at least `min_stock` units.
    pub async fn product_in_stock(&self, min_stock: i64) -> Value {
        self.products_in_stock(min_stock)
            .await
            .into_iter()
            .next()
            .expect("no product in stock, run `ym-cli stock reset`")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered customer.
pub struct TestCustomer {
    pub email: String,
    pub password: String,
    pub token: String,
}

/// An address nobody else uses.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// Read a money field, serialized as a string or a number.
#[must_use]
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("money string"),
        Value::Number(n) => n.to_string().parse().expect("money number"),
        other => panic!("not a money value: {other}"),
    }
}

/// A guest checkout body for one product.
#[must_use]
pub fn order_body(product_id: i64, quantity: u32, coupon: Option<&str>) -> Value {
    order_body_lines(&[(product_id, quantity)], coupon)
}

/// A guest checkout body with one line per `(product_id, quantity)`.
#[must_use]
pub fn order_body_lines(lines: &[(i64, u32)], coupon: Option<&str>) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(product_id, quantity)| json!({ "product_id": product_id, "quantity": quantity }))
        .collect();
    json!({
        "items": items,
        "shipping_address": {
            "line1": "12 Rue de Sanaa",
            "city": "Paris",
            "postal_code": "75011",
            "country": "FR"
        },
        "email": unique_email(),
        "phone": "+33600000000",
        "coupon_code": coupon,
        "payment_intent_id": format!("pi_test_{}", Uuid::new_v4().simple())
    })
}
