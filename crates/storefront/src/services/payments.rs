//! Stripe REST client for card payments.
//!
//! Only the two calls the store needs are implemented: creating a
//! PaymentIntent for the checkout page and retrieving the account to check
//! that a secret key works. The secret key is passed per call because it
//! can be changed at runtime from the back-office.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Currency charged for every order.
pub const CURRENCY: &str = "usd";

/// Errors that can occur when calling the Stripe API.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A created PaymentIntent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

/// The Stripe account a secret key belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub charges_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Stripe API client.
#[derive(Clone, Debug)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
}

impl StripeClient {
    /// Create a client for the live Stripe API.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Create a client against another API root (used by tests).
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Create a PaymentIntent for `amount` minor units with automatic
    /// payment methods enabled.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` if Stripe rejects the request.
    pub async fn create_payment_intent(
        &self,
        secret_key: &SecretString,
        amount: i64,
    ) -> Result<PaymentIntent, PaymentError> {
        let amount = amount.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", CURRENCY),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .bearer_auth(secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let intent: PaymentIntent = Self::parse(response).await?;
        tracing::info!(payment_intent = %intent.id, amount = intent.amount, "PaymentIntent created");
        Ok(intent)
    }

    /// Retrieve the account the key belongs to.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` if the key is rejected.
    pub async fn retrieve_account(&self, secret_key: &SecretString) -> Result<Account, PaymentError> {
        let response = self
            .client
            .get(format!("{}/account", self.base_url))
            .bearer_auth(secret_key.expose_secret())
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Pull the human-readable message out of a Stripe error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match (envelope.error.message, envelope.error.code) {
            (Some(message), _) => message,
            (None, Some(code)) => code,
            (None, None) => "unknown error".to_owned(),
        },
        Err(_) => body.chars().take(200).collect(),
    }
}
