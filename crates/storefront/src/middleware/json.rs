//! JSON request bodies that reject through [`AppError`].
//!
//! Axum's own `Json` rejection is a plain-text 415 or 422 carrying serde's
//! message. Handlers take [`ApiJson`] instead so a bad body is a 400 with the
//! usual `{"error": ...}` shape.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` with rejections converted into [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
