//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ym-cli migrate
//! ```
//!
//! Migration files live in `crates/storefront/migrations/` and are embedded
//! at compile time.

use super::{CliError, connect};

/// Apply pending storefront migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
