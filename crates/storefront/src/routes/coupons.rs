//! Coupon validation for the cart page.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::db::CouponRepository;
use crate::error::{AppError, Result};
use crate::middleware::ApiJson;
use crate::models::{CouponRejection, CouponValidation, CouponValidationRequest};
use crate::state::AppState;

/// Check a coupon against the cart total without consuming it.
///
/// POST /api/coupons/validate
#[instrument(skip(state, body))]
pub async fn validate(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CouponValidationRequest>,
) -> Result<Json<CouponValidation>> {
    let unknown = || AppError::NotFound(CouponRejection::Unknown.to_string());
    let code = body.code().ok_or_else(unknown)?;

    let coupon = CouponRepository::new(state.pool())
        .get_by_code(code)
        .await?
        .ok_or_else(unknown)?;

    coupon
        .redeem(Utc::now(), body.cart_total())
        .map_err(|rejection| AppError::BadRequest(rejection.to_string()))?;

    Ok(Json(CouponValidation::from(&coupon)))
}
