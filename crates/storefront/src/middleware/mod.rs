//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (permissive, the SPA may be served from another origin in development)
//! 5. Security headers (frame, sniffing, referrer)
//! 6. Rate limiting (governor) on `/api`
//!
//! Authentication is not a layer: handlers take the extractors in [`auth`].
//! Request bodies go through [`json::ApiJson`].

pub mod auth;
pub mod json;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{OptionalCustomer, RequireAdmin, RequireAuth, RequireCustomer};
pub use json::ApiJson;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
