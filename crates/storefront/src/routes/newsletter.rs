//! Newsletter sign-up.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use yemeni_market_core::Email;

use crate::db::{NewsletterRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::ApiJson;
use crate::models::NewsletterRequest;
use crate::state::AppState;

/// Language used when the sign-up form does not send one.
const DEFAULT_LANG: &str = "fr";

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub message: &'static str,
}

/// Subscribe an email address and send the welcome email.
///
/// POST /api/newsletter
#[instrument(skip(state, body))]
pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewsletterRequest>,
) -> Result<Json<SubscribeResponse>> {
    let missing = || AppError::BadRequest("Email and GDPR consent are required".to_owned());
    let raw_email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(missing)?;
    if !body.has_consent() {
        return Err(missing());
    }
    let email = Email::parse(raw_email)
        .map_err(|_| AppError::BadRequest("Invalid email address".to_owned()))?;
    let lang = body
        .lang
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANG);

    let already = SubscribeResponse {
        success: None,
        message: "Already subscribed!",
    };
    let subscribers = NewsletterRepository::new(state.pool());
    if subscribers.exists(&email).await? {
        return Ok(Json(already));
    }
    match subscribers.subscribe(&email, lang).await {
        Ok(subscriber) => {
            tracing::info!(subscriber_id = %subscriber.id, lang = %subscriber.lang, "Newsletter subscription");
        }
        // Lost a race with a concurrent sign-up for the same address
        Err(RepositoryError::Conflict(_)) => return Ok(Json(already)),
        Err(e) => return Err(e.into()),
    }

    let products_url = format!("{}/products", state.config().base_url);
    if let Err(e) = state
        .email()
        .send_newsletter_welcome(email.as_str(), lang, &products_url)
        .await
    {
        tracing::error!(error = %e, "Failed to send newsletter welcome email");
    }

    Ok(Json(SubscribeResponse {
        success: Some(true),
        message: "Subscribed successfully",
    }))
}
