//! Security headers middleware for clickjacking and MIME sniffing protection.
//!
//! The SPA loads Stripe.js and its payment frames from third-party origins,
//! so no `Content-Security-Policy` is set here; the SPA build is expected to
//! ship its own policy.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
    },
    middleware::Next,
    response::Response,
};

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin` - Keep paths private cross-origin
/// - `Permissions-Policy` - Deny device features the shop never uses
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // `payment` stays allowed for Stripe's payment request button
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             microphone=(), \
             geolocation=(), \
             usb=(), \
             interest-cohort=()",
        ),
    );

    response
}
