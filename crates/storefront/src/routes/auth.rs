//! Account registration, login and password reset.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use yemeni_market_core::{AdminRole, CustomerId};

use crate::error::{AppError, Result};
use crate::middleware::ApiJson;
use crate::services::auth::{AuthService, LoginOutcome};
use crate::state::AppState;

/// Body of `POST /api/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user_id: CustomerId,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Account summary returned with a login token.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: LoginUser,
}

/// Body of `POST /api/auth/forgot-password`.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /api/auth/reset-password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Register a customer account.
///
/// POST /api/auth/register
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let customer = auth
        .register(&req.full_name, &req.email, &req.password)
        .await?;

    tracing::info!(customer_id = %customer.id, "Customer registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered",
            user_id: customer.id,
        }),
    ))
}

/// Log in as an admin or a customer.
///
/// POST /api/auth/login
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());

    let response = match auth.login(&req.email, &req.password).await? {
        LoginOutcome::Admin(admin) => {
            tracing::info!(admin_id = %admin.id, "Admin logged in");
            LoginResponse {
                message: "Admin Login successful",
                token: state.tokens().issue_admin(&admin)?,
                user: LoginUser {
                    id: admin.id.as_i32(),
                    full_name: admin.name,
                    email: admin.email.into_inner(),
                    role: Some(admin.role),
                },
            }
        }
        LoginOutcome::Customer(customer) => {
            tracing::info!(customer_id = %customer.id, "Customer logged in");
            LoginResponse {
                message: "Login successful",
                token: state.tokens().issue_customer(&customer)?,
                user: LoginUser {
                    id: customer.id.as_i32(),
                    full_name: customer.full_name(),
                    email: customer.email.into_inner(),
                    role: None,
                },
            }
        }
    };

    Ok(Json(response))
}

/// Email a password reset link.
///
/// POST /api/auth/forgot-password
#[instrument(skip(state, req))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (customer, token) = auth.start_password_reset(&req.email).await?;

    let link = state.config().password_reset_link(&token);
    state
        .email()
        .send_password_reset(customer.email.as_str(), &link)
        .await
        .map_err(|e| AppError::Internal(format!("reset email failed: {e}")))?;

    tracing::info!(customer_id = %customer.id, "Password reset link sent");
    Ok(Json(MessageResponse {
        message: "Reset link sent",
    }))
}

/// Set a new password from a reset token.
///
/// POST /api/auth/reset-password
#[instrument(skip(state, req))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    auth.reset_password(&req.token, &req.new_password).await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}
