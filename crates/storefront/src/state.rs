//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::auth::TokenService;
use crate::services::email::EmailService;
use crate::services::payments::StripeClient;
use crate::services::settings::SettingsStore;

/// Timeout for outbound calls to the payment provider.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error creating the outbound HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("failed to build HTTP client: {0}")]
pub struct HttpClientError(#[from] reqwest::Error);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    settings: Arc<SettingsStore>,
    email: EmailService,
    tokens: TokenService,
    stripe: StripeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The settings snapshot starts empty; call
    /// [`SettingsStore::reload`] on [`AppState::settings`] to load
    /// `store_config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, HttpClientError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self::with_stripe(config, pool, StripeClient::new(http)))
    }

    /// Create a state with a specific Stripe client.
    #[must_use]
    pub fn with_stripe(config: StorefrontConfig, pool: PgPool, stripe: StripeClient) -> Self {
        let settings = Arc::new(SettingsStore::new(
            config.smtp.clone(),
            config.stripe.clone(),
        ));
        let email = EmailService::new(Arc::clone(&settings));
        let tokens = TokenService::new(&config.jwt_secret);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                settings,
                email,
                tokens,
                stripe,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Runtime settings (SMTP, Stripe keys) loaded from `store_config`.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Issues and verifies bearer tokens.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }
}
