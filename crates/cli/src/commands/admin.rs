//! Admin account management.
//!
//! # Usage
//!
//! ```bash
//! ym-cli admin create -e admin@example.com -n "Admin Name" -r SUPER_ADMIN -p 'long-passphrase'
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_PASSWORD` - Password used when `--password` is omitted

use yemeni_market_core::{AdminId, AdminRole, Email};
use yemeni_market_storefront::db::{AdminRepository, RepositoryError};
use yemeni_market_storefront::services::auth::hash_password;

use super::{CliError, connect};

/// Parse the role argument. Lowercase spellings are accepted.
fn parse_role(role: &str) -> Result<AdminRole, CliError> {
    role.trim()
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created admin.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<String>,
) -> Result<AdminId, CliError> {
    let role = parse_role(role)?;
    let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;

    let password = match password {
        Some(p) => p,
        None => std::env::var("ADMIN_PASSWORD")
            .map_err(|_| CliError::MissingEnvVar("ADMIN_PASSWORD"))?,
    };
    let password_hash = hash_password(&password)?;

    let pool = connect().await?;
    let admins = AdminRepository::new(&pool);

    if admins.get_by_email(&email).await?.is_some() {
        return Err(CliError::AdminExists(email.into_inner()));
    }

    tracing::info!("Creating admin: {} ({})", email, role.as_str());
    let admin = admins
        .create(&email, &password_hash, name.trim(), role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CliError::AdminExists(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        "Admin created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role.as_str()
    );

    Ok(admin.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("SUPER_ADMIN").unwrap(), AdminRole::SuperAdmin);
        assert_eq!(parse_role("admin").unwrap(), AdminRole::Admin);
        assert!(matches!(parse_role("viewer"), Err(CliError::InvalidRole(r)) if r == "viewer"));
    }
}
