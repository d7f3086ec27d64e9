//! Store settings edits from the command line.

use yemeni_market_storefront::db::StoreConfigRepository;

use super::{CliError, connect};

/// Replace the stored Stripe keys. The running server picks them up on its
/// next settings reload or restart.
pub async fn set_stripe_keys(public_key: &str, secret_key: &str) -> Result<(), CliError> {
    let pool = connect().await?;
    let settings = StoreConfigRepository::new(&pool);

    for (key, value) in [
        ("stripe_public_key", public_key.trim()),
        ("stripe_secret_key", secret_key.trim()),
    ] {
        settings.set_value(key, value).await?;
        tracing::info!("Updated {key}");
    }
    Ok(())
}
