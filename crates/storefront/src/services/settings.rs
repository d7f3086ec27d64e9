//! Runtime store settings.
//!
//! Settings live in the `store_config` table and are held in memory as an
//! immutable snapshot. The snapshot is swapped wholesale after an admin
//! edits a setting, so readers never observe a half-applied update.
//!
//! Environment values are merged in when the snapshot is built:
//! SMTP variables override the database, while Stripe keys stored in the
//! database win over the environment.

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::config::{SmtpOverrides, StripeFallback};
use crate::db::{RepositoryError, StoreConfigRepository};

/// Implicit-TLS SMTP port, also the default when none is configured.
const SMTPS_PORT: u16 = 465;

/// Sender name used when `smtp_from_name` is not set.
const DEFAULT_FROM_NAME: &str = "Yemeni Market";

pub const SMTP_HOST: &str = "smtp_host";
pub const SMTP_PORT: &str = "smtp_port";
pub const SMTP_USER: &str = "smtp_user";
pub const SMTP_PASS: &str = "smtp_pass";
pub const SMTP_SECURE: &str = "smtp_secure";
pub const SMTP_FROM_NAME: &str = "smtp_from_name";
pub const STRIPE_SECRET_KEY: &str = "stripe_secret_key";
pub const STRIPE_PUBLIC_KEY: &str = "stripe_public_key";

/// An immutable, merged view of the store settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

/// Resolved SMTP transport settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    /// Implicit TLS when `true`, STARTTLS otherwise.
    pub secure: bool,
    pub from_name: String,
}

impl Settings {
    /// Merge database rows with the environment.
    #[must_use]
    pub fn merge(
        mut values: HashMap<String, String>,
        smtp: &SmtpOverrides,
        stripe: &StripeFallback,
    ) -> Self {
        use secrecy::ExposeSecret;

        // Empty rows count as unset
        values.retain(|_, v| !v.trim().is_empty());

        let env_smtp = [
            (SMTP_HOST, smtp.host.clone()),
            (SMTP_PORT, smtp.port.map(|p| p.to_string())),
            (SMTP_USER, smtp.user.clone()),
            (
                SMTP_PASS,
                smtp.password.as_ref().map(|p| p.expose_secret().to_owned()),
            ),
            (SMTP_SECURE, smtp.secure.map(|s| s.to_string())),
            (SMTP_FROM_NAME, smtp.from_name.clone()),
        ];
        for (key, value) in env_smtp {
            if let Some(value) = value {
                values.insert(key.to_owned(), value);
            }
        }

        let env_stripe = [
            (
                STRIPE_SECRET_KEY,
                stripe
                    .secret_key
                    .as_ref()
                    .map(|k| k.expose_secret().to_owned()),
            ),
            (STRIPE_PUBLIC_KEY, stripe.public_key.clone()),
        ];
        for (key, value) in env_stripe {
            if let Some(value) = value {
                values.entry(key.to_owned()).or_insert(value);
            }
        }

        Self { values }
    }

    /// A non-empty setting value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Stripe secret key, if one is configured.
    #[must_use]
    pub fn stripe_secret_key(&self) -> Option<SecretString> {
        self.get(STRIPE_SECRET_KEY).map(SecretString::from)
    }

    /// SMTP host as configured, for diagnostics.
    #[must_use]
    pub fn smtp_host(&self) -> Option<&str> {
        self.get(SMTP_HOST)
    }

    /// SMTP transport settings, or `None` when no host or user is set.
    ///
    /// An unparsable port falls back to 465. `secure` follows
    /// `smtp_secure` when it is `true` or `false`, otherwise it is on for
    /// port 465.
    #[must_use]
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.get(SMTP_HOST)?.to_owned();
        let user = self.get(SMTP_USER)?.to_owned();
        let port = self
            .get(SMTP_PORT)
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(SMTPS_PORT);
        let secure = match self.get(SMTP_SECURE) {
            Some("true") => true,
            Some("false") => false,
            _ => port == SMTPS_PORT,
        };

        Some(SmtpSettings {
            host,
            port,
            user,
            password: SecretString::from(self.get(SMTP_PASS).unwrap_or_default()),
            secure,
            from_name: self
                .get(SMTP_FROM_NAME)
                .unwrap_or(DEFAULT_FROM_NAME)
                .to_owned(),
        })
    }
}

/// Shared holder of the current settings snapshot.
pub struct SettingsStore {
    current: RwLock<Arc<Settings>>,
    smtp: SmtpOverrides,
    stripe: StripeFallback,
}

impl SettingsStore {
    /// Start with an environment-only snapshot.
    #[must_use]
    pub fn new(smtp: SmtpOverrides, stripe: StripeFallback) -> Self {
        let initial = Settings::merge(HashMap::new(), &smtp, &stripe);
        Self {
            current: RwLock::new(Arc::new(initial)),
            smtp,
            stripe,
        }
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&*self.current.read().await)
    }

    /// Rebuild the snapshot from the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the settings cannot be read; the previous
    /// snapshot stays in place.
    pub async fn reload(&self, pool: &PgPool) -> Result<(), RepositoryError> {
        let rows = StoreConfigRepository::new(pool).all_values().await?;
        let merged = Arc::new(Settings::merge(rows, &self.smtp, &self.stripe));
        *self.current.write().await = merged;

        tracing::info!("Store settings reloaded");
        Ok(())
    }
}
