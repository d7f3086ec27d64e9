//! Payment provider connectivity check.

use std::time::Duration;

use secrecy::SecretString;

use yemeni_market_storefront::db::StoreConfigRepository;
use yemeni_market_storefront::services::payments::StripeClient;

use super::{CliError, connect};

/// Secret key as the server would pick it: the stored setting, else the
/// environment.
fn pick_secret_key(stored: Option<String>, env: Option<String>) -> Option<SecretString> {
    stored
        .filter(|k| !k.trim().is_empty())
        .or_else(|| env.filter(|k| !k.trim().is_empty()))
        .map(SecretString::from)
}

/// Retrieve the Stripe account for the configured secret key.
pub async fn check() -> Result<(), CliError> {
    let pool = connect().await?;
    let stored = StoreConfigRepository::new(&pool)
        .all_values()
        .await?
        .remove("stripe_secret_key");

    let secret_key = pick_secret_key(stored, std::env::var("STRIPE_SECRET_KEY").ok())
        .ok_or(CliError::StripeNotConfigured)?;

    tracing::info!("Testing Stripe connectivity...");
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let account = StripeClient::new(http).retrieve_account(&secret_key).await?;

    tracing::info!("Stripe connection successful");
    tracing::info!("  Account ID: {}", account.id);
    tracing::info!("  Country: {}", account.country.as_deref().unwrap_or("N/A"));
    tracing::info!("  Email: {}", account.email.as_deref().unwrap_or("N/A"));
    tracing::info!("  Charges enabled: {}", account.charges_enabled);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_stored_key_wins_over_environment() {
        let key = pick_secret_key(Some("sk_db".into()), Some("sk_env".into())).unwrap();
        assert_eq!(key.expose_secret(), "sk_db");

        let key = pick_secret_key(Some("  ".into()), Some("sk_env".into())).unwrap();
        assert_eq!(key.expose_secret(), "sk_env");

        assert!(pick_secret_key(None, None).is_none());
    }
}
