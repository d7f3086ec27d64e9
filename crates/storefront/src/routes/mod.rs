//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness (main.rs)
//! GET  /health/ready                   - Readiness, pings the database (main.rs)
//!
//! # Auth (strict rate limit)
//! POST /api/auth/register              - Create a customer account
//! POST /api/auth/login                 - Admin or customer login, returns a bearer token
//! POST /api/auth/forgot-password       - Email a reset link
//! POST /api/auth/reset-password        - Set a new password from a reset token
//!
//! # Catalog
//! GET  /api/products                   - Active products, filtered and sorted
//! GET  /api/products/{id}              - Product detail with variants and reviews
//! GET  /api/products/{id}/reviews      - Reviews, newest first
//! POST /api/products/{id}/reviews      - Post a review (customer)
//!
//! # Cart and checkout
//! POST /api/coupons/validate           - Check a coupon code
//! POST /api/create-payment-intent      - Stripe PaymentIntent for the cart
//! POST /api/orders                     - Place an order
//! GET  /api/orders                     - Order history (customer)
//!
//! # Customer account (customer)
//! GET  /api/wishlist                   - Wishlisted products
//! POST /api/wishlist/toggle            - Add or remove a product
//! GET  /api/customer/address           - Saved addresses
//! POST /api/customer/address           - Save an address
//! GET  /api/customer/invoices          - Invoices with their orders
//! GET  /api/invoices/{id}/pdf          - Invoice PDF (owner or admin)
//!
//! # Misc
//! POST /api/newsletter                 - Newsletter sign-up
//! GET  /api/config                     - Public store settings
//! GET  /api/test                       - Connectivity check
//!
//! # Back-office (admin)
//! GET  /api/admin/stats                - Dashboard figures
//! GET  /api/admin/orders               - All orders
//! PUT  /api/admin/orders/{id}/status   - Change order status
//! GET  /api/admin/products             - All products
//! POST /api/admin/products             - Create product
//! PUT  /api/admin/products/{id}        - Update product
//! DELETE /api/admin/products/{id}      - Deactivate product
//! GET  /api/admin/customers            - Customers with order totals
//! GET  /api/admin/config               - All settings
//! PUT  /api/admin/config               - Upsert a setting
//!
//! # Everything else
//! GET  /*                              - Built SPA with index.html fallback
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod config;
pub mod coupons;
pub mod diagnostics;
pub mod invoices;
pub mod newsletter;
pub mod orders;
pub mod payments;
pub mod products;
pub mod wishlist;

use std::path::Path;

use axum::{
    Router,
    extract::Request,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
}

/// Create the back-office routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", put(admin::update_order_status))
        .route(
            "/products",
            get(admin::products).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/customers", get(admin::customers))
        .route("/config", get(admin::config).put(admin::update_config))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .route("/wishlist", get(wishlist::index))
        .route("/wishlist/toggle", post(wishlist::toggle))
        .route("/coupons/validate", post(coupons::validate))
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .route("/orders", get(orders::index).post(orders::create))
        .route(
            "/customer/address",
            get(account::addresses).post(account::create_address),
        )
        .route("/customer/invoices", get(account::invoices))
        .route("/invoices/{id}/pdf", get(invoices::pdf))
        .route("/newsletter", post(newsletter::subscribe))
        .route("/config", get(config::public))
        .route("/test", get(diagnostics::api_test))
        .nest("/admin", admin_routes())
        .fallback(diagnostics::api_not_found)
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront, with the shared middleware stack.
pub fn routes(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes())
        .merge(diagnostics::spa_router(static_dir))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
}
