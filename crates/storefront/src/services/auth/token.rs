//! Signed bearer tokens (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use yemeni_market_core::{AccountKind, AdminId, AdminRole, CustomerId};

use super::AuthError;
use crate::models::{Admin, Customer};

/// Lifetime of a login token.
pub const ACCESS_TOKEN_TTL: Duration = Duration::hours(24);

/// Lifetime of a password reset token.
pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id, as a string.
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn account_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }

    /// Customer id, for customer and reset tokens.
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self.kind {
            AccountKind::Customer | AccountKind::Reset => self.account_id().map(CustomerId::new),
            AccountKind::Admin => None,
        }
    }

    /// Admin id, for admin tokens.
    #[must_use]
    pub fn admin_id(&self) -> Option<AdminId> {
        match self.kind {
            AccountKind::Admin => self.account_id().map(AdminId::new),
            AccountKind::Customer | AccountKind::Reset => None,
        }
    }
}

/// Issues and verifies tokens with the server's secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Login token for a customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue_customer(&self, customer: &Customer) -> Result<String, AuthError> {
        self.sign(
            customer.id.to_string(),
            customer.email.as_str(),
            None,
            AccountKind::Customer,
            ACCESS_TOKEN_TTL,
        )
    }

    /// Login token for an admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue_admin(&self, admin: &Admin) -> Result<String, AuthError> {
        self.sign(
            admin.id.to_string(),
            admin.email.as_str(),
            Some(admin.role),
            AccountKind::Admin,
            ACCESS_TOKEN_TTL,
        )
    }

    /// Single-purpose password reset token for a customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue_reset(&self, customer: &Customer) -> Result<String, AuthError> {
        self.sign(
            customer.id.to_string(),
            customer.email.as_str(),
            None,
            AccountKind::Reset,
            RESET_TOKEN_TTL,
        )
    }

    fn sign(
        &self,
        sub: String,
        email: &str,
        role: Option<AdminRole>,
        kind: AccountKind,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            email: email.to_owned(),
            role,
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any verification failure.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yemeni_market_core::Email;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"))
    }

    fn customer() -> Customer {
        Customer {
            id: CustomerId::new(42),
            email: Email::parse("amina@example.com").unwrap(),
            password_hash: None,
            first_name: "Amina".to_owned(),
            last_name: "Saleh".to_owned(),
            phone: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_customer_token_round_trip() {
        let tokens = service();
        let token = tokens.issue_customer(&customer()).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.kind, AccountKind::Customer);
        assert_eq!(claims.customer_id(), Some(CustomerId::new(42)));
        assert_eq!(claims.admin_id(), None);
        assert_eq!(claims.email, "amina@example.com");
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL.num_seconds());
    }

    #[test]
    fn test_admin_token_carries_role() {
        let tokens = service();
        let now = Utc::now();
        let admin = Admin {
            id: AdminId::new(1),
            email: Email::parse("admin@yemeni.market").unwrap(),
            password_hash: String::new(),
            name: "Admin".to_owned(),
            role: AdminRole::SuperAdmin,
            created_at: now,
            updated_at: now,
        };
        let claims = tokens.verify(&tokens.issue_admin(&admin).unwrap()).unwrap();
        assert_eq!(claims.kind, AccountKind::Admin);
        assert_eq!(claims.role, Some(AdminRole::SuperAdmin));
        assert_eq!(claims.admin_id(), Some(AdminId::new(1)));
    }

    #[test]
    fn test_reset_token_is_short_lived() {
        let tokens = service();
        let claims = tokens
            .verify(&tokens.issue_reset(&customer()).unwrap())
            .unwrap();
        assert_eq!(claims.kind, AccountKind::Reset);
        assert_eq!(claims.exp - claims.iat, RESET_TOKEN_TTL.num_seconds());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().issue_customer(&customer()).unwrap();
        let other = TokenService::new(&SecretString::from("zZ9!qW8@eR7#tY6$uI5%oP4^aS3&dF2*"));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .sign(
                "42".to_owned(),
                "amina@example.com",
                None,
                AccountKind::Customer,
                Duration::seconds(-10),
            )
            .unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            service().verify("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }
}
