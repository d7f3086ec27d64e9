//! Subcommand implementations.
//!
//! Every command reads `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) from the
//! environment, loading `.env` first.

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use yemeni_market_storefront::db::{self, RepositoryError};
use yemeni_market_storefront::services::auth::AuthError;
use yemeni_market_storefront::services::payments::PaymentError;

pub mod admin;
pub mod config;
pub mod migrate;
pub mod seed;
pub mod stock;
pub mod stripe;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: SUPER_ADMIN, ADMIN")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Admin already exists.
    #[error("Admin already exists with email: {0}")]
    AdminExists(String),

    #[error("Password error: {0}")]
    Password(#[from] AuthError),

    #[error("Catalog file error: {0}")]
    CatalogFile(String),

    #[error("Stripe error: {0}")]
    Stripe(#[from] PaymentError),

    #[error("Stripe is not configured: set stripe_secret_key or STRIPE_SECRET_KEY")]
    StripeNotConfigured,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Database URL from the environment.
fn database_url() -> Result<SecretString, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Connect to the storefront database.
async fn connect() -> Result<PgPool, CliError> {
    let url = database_url()?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&url).await?)
}
