//! Database operations for the storefront `PostgreSQL` database.
//!
//! # Database: `yemeni_market`
//!
//! ## Tables
//!
//! - `categories`, `products`, `product_variants` - Catalog
//! - `customers`, `addresses`, `wishlist`, `reviews` - Customer data
//! - `admins` - Back-office accounts
//! - `orders`, `order_items`, `transactions`, `invoices` - Sales
//! - `coupons` - Discount codes
//! - `store_config` - Runtime key/value settings
//! - `newsletter_subscribers` - Marketing opt-ins
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p yemeni-market-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod admins;
pub mod categories;
pub mod coupons;
pub mod customers;
pub mod invoices;
pub mod newsletter;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod store_config;
pub mod wishlist;

pub use addresses::AddressRepository;
pub use admins::AdminRepository;
pub use categories::CategoryRepository;
pub use coupons::CouponRepository;
pub use customers::CustomerRepository;
pub use invoices::InvoiceRepository;
pub use newsletter::NewsletterRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use store_config::StoreConfigRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict(message)`.
    pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
