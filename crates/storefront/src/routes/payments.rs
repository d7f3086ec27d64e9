//! Card payment intent for the checkout page.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use yemeni_market_core::to_minor_units;

use crate::error::{AppError, Result};
use crate::middleware::ApiJson;
use crate::models::PaymentIntentRequest;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Price the cart server-side and open a Stripe PaymentIntent for it.
///
/// POST /api/create-payment-intent
#[instrument(skip(state, body))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>> {
    let secret_key = state
        .settings()
        .snapshot()
        .await
        .stripe_secret_key()
        .ok_or_else(|| AppError::BadRequest("Stripe is not configured on this server.".to_owned()))?;

    let coupon_code = body
        .coupon_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let totals = CheckoutService::new(state.pool(), state.email())
        .quote(&body.cart_lines(), coupon_code)
        .await?;

    tracing::info!(
        subtotal = %totals.subtotal,
        discount = %totals.discount,
        tax = %totals.tax,
        shipping = %totals.shipping,
        total = %totals.total,
        "Cart priced for payment"
    );

    if totals.total <= rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Total amount must be greater than 0".to_owned(),
        ));
    }
    let amount = to_minor_units(totals.total)
        .ok_or_else(|| AppError::BadRequest("Total amount is too large".to_owned()))?;

    let intent = state
        .stripe()
        .create_payment_intent(&secret_key, amount)
        .await?;

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
