//! Unified error handling with Sentry integration.
//!
//! Every API handler returns `Result<T, AppError>`. Errors are rendered as a
//! JSON body `{"error": "<message>"}`; server-side failures are captured to
//! Sentry and replaced with a generic message before reaching the client.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::invoice_pdf::InvoicePdfError;
use crate::services::payments::PaymentError;

/// Application-level error type for the storefront API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Order could not be placed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Invoice PDF could not be rendered.
    #[error("PDF error: {0}")]
    Pdf(#[from] InvoicePdfError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Credentials missing.
    #[error("{0}")]
    Unauthorized(String),

    /// Credentials present but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) | Self::Pdf(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(err) => {
                if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::Auth(err) => match err {
                AuthError::MissingFields
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::UserAlreadyExists
                | AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::InvalidTokenType => StatusCode::BAD_REQUEST,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::PasswordHash(_) | AuthError::Token(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the client. Never includes internal details.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Payment(_) => "Payment provider error, please try again".to_owned(),
            Self::Pdf(_) => "Failed to generate PDF".to_owned(),
            Self::Checkout(err) => {
                if err.is_client_error() {
                    err.to_string()
                } else {
                    "Failed to create order".to_owned()
                }
            }
            Self::Auth(err) => match err {
                AuthError::MissingFields => "All fields required".to_owned(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::UserAlreadyExists => "Email already registered".to_owned(),
                AuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                AuthError::UserNotFound => "User not found".to_owned(),
                AuthError::InvalidToken => "Invalid or expired token".to_owned(),
                AuthError::InvalidTokenType => "Invalid token type".to_owned(),
                AuthError::Repository(_) | AuthError::PasswordHash(_) | AuthError::Token(_) => {
                    "Internal server error".to_owned()
                }
            },
            _ => self.to_string(),
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error() || matches!(self, Self::Payment(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        // serde's message names internal fields; keep it in the logs only.
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON body",
            _ => "Invalid request body",
        };
        Self::BadRequest(message.to_owned())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated principal.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
