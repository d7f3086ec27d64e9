//! Authentication service.
//!
//! Password accounts for customers and admins. Passwords are hashed with
//! bcrypt; sessions are stateless signed tokens (see [`token`]).

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenService};

use sqlx::PgPool;

use yemeni_market_core::{AccountKind, Email};

use crate::db::{AdminRepository, CustomerRepository, RepositoryError};
use crate::models::{Admin, Customer};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt work factor.
const BCRYPT_COST: u32 = 10;

/// Who a successful login belongs to.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Admin(Admin),
    Customer(Customer),
}

/// Authentication service.
pub struct AuthService<'a> {
    customers: CustomerRepository<'a>,
    admins: AdminRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
            admins: AdminRepository::new(pool),
            tokens,
        }
    }

    /// Register a customer. The first word of `full_name` becomes the first
    /// name, the rest the last name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Customer, AuthError> {
        if full_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let (first_name, last_name) = split_full_name(full_name);
        let password_hash = hash_password(password)?;

        let customer = self
            .customers
            .create(&email, &password_hash, first_name, last_name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(customer)
    }

    /// Check credentials against admins first, then customers.
    ///
    /// An admin whose password does not match falls through to the customer
    /// table, so a shared email still lets the customer sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no account matches.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        if let Some(admin) = self.admins.get_by_email(&email).await?
            && verify_password(password, &admin.password_hash)?
        {
            return Ok(LoginOutcome::Admin(admin));
        }

        let customer = self
            .customers
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = customer
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(LoginOutcome::Customer(customer))
    }

    /// Issue a reset token for a customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no customer has this email.
    pub async fn start_password_reset(
        &self,
        email: &str,
    ) -> Result<(Customer, String), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::UserNotFound)?;
        let customer = self
            .customers
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let token = self.tokens.issue_reset(&customer)?;

        Ok((customer, token))
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not verify.
    /// Returns `AuthError::InvalidTokenType` if it is not a reset token.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let claims = self.tokens.verify(token)?;
        if claims.kind != AccountKind::Reset {
            return Err(AuthError::InvalidTokenType);
        }
        let customer_id = claims.customer_id().ok_or(AuthError::InvalidToken)?;
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.customers
            .update_password(customer_id, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        Ok(())
    }
}

/// Split a display name into first name and the remainder.
fn split_full_name(full_name: &str) -> (&str, &str) {
    let trimmed = full_name.trim();
    trimmed
        .split_once(char::is_whitespace)
        .map_or((trimmed, ""), |(first, rest)| (first, rest.trim()))
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with bcrypt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Verify a password against a bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    match bcrypt::verify(password, hash) {
        Ok(valid) => Ok(valid),
        Err(bcrypt::BcryptError::InvalidHash(_) | bcrypt::BcryptError::InvalidPrefix(_)) => {
            Ok(false)
        }
        Err(e) => Err(AuthError::PasswordHash(e)),
    }
}
