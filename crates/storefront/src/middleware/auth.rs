//! Bearer token extractors.
//!
//! Tokens are read from `Authorization: Bearer <jwt>`. A missing token is
//! 401; a token that fails verification, or a password reset token, is 403.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use yemeni_market_core::{AccountKind, AdminId, CustomerId};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::Claims;
use crate::state::AppState;

/// Extractor that requires a valid customer or admin token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(claims): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", claims.email)
/// }
/// ```
pub struct RequireAuth(pub Claims);

/// Extractor that requires a customer token.
pub struct RequireCustomer {
    pub id: CustomerId,
    pub claims: Claims,
}

/// Extractor that requires an admin token.
pub struct RequireAdmin {
    pub id: AdminId,
    pub claims: Claims,
}

/// Extractor for routes that accept guests.
///
/// Holds the customer id when a valid customer token is present. Invalid
/// or missing tokens are treated as a guest rather than rejected.
pub struct OptionalCustomer(pub Option<CustomerId>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut words = value.split_whitespace();
    let scheme = words.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    words.next().filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_owned()))?;

        let claims = state
            .tokens()
            .verify(token)
            .map_err(|_| AppError::Forbidden("Invalid or expired token".to_owned()))?;

        if claims.kind == AccountKind::Reset {
            return Err(AppError::Forbidden("Invalid or expired token".to_owned()));
        }

        set_sentry_user(&claims.sub, Some(&claims.email));
        Ok(Self(claims))
    }
}

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;
        let id = claims
            .customer_id()
            .ok_or_else(|| AppError::Forbidden("Customer account required".to_owned()))?;

        Ok(Self { id, claims })
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;
        let id = claims
            .admin_id()
            .ok_or_else(|| AppError::Forbidden("Admin access required".to_owned()))?;

        Ok(Self { id, claims })
    }
}

impl FromRequestParts<AppState> for OptionalCustomer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let customer = bearer_token(parts)
            .and_then(|token| state.tokens().verify(token).ok())
            .filter(|claims| claims.kind == AccountKind::Customer)
            .and_then(|claims| claims.customer_id());

        Ok(Self(customer))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
