//! Discount coupons and their redemption rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use yemeni_market_core::{CouponId, Discount, DiscountType};

/// A coupon row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub expiration_date: Option<DateTime<Utc>>,
    /// Zero means unlimited.
    pub usage_limit: i32,
    pub used_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Why a coupon cannot be redeemed. `Display` is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Invalid coupon code")]
    Unknown,
    #[error("Coupon is inactive")]
    Inactive,
    #[error("Coupon usage limit reached")]
    UsageLimitReached,
    #[error("Coupon expired")]
    Expired,
    #[error("Minimum order amount is ${0}")]
    BelowMinimum(Decimal),
}

impl Coupon {
    /// Check every redemption rule in order and return the discount.
    ///
    /// # Errors
    ///
    /// Returns the first rule the coupon fails.
    pub fn redeem(&self, now: DateTime<Utc>, cart_total: Decimal) -> Result<Discount, CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.usage_limit > 0 && self.used_count >= self.usage_limit {
            return Err(CouponRejection::UsageLimitReached);
        }
        if self.expiration_date.is_some_and(|expires| now > expires) {
            return Err(CouponRejection::Expired);
        }
        if let Some(minimum) = self.min_order_amount
            && cart_total < minimum
        {
            return Err(CouponRejection::BelowMinimum(minimum));
        }
        Ok(Discount::from_coupon(self.discount_type, self.value))
    }
}

/// Body of `POST /api/coupons/validate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidationRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub cart_total: Option<serde_json::Value>,
}

impl CouponValidationRequest {
    /// Trimmed code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Cart total the customer sees. Missing or unparsable totals count as zero.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.cart_total
            .as_ref()
            .and_then(super::catalog::decimal_from_json)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Successful validation reply.
#[derive(Debug, Clone, Serialize)]
pub struct CouponValidation {
    pub code: String,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

impl From<&Coupon> for CouponValidation {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            value: coupon.value,
        }
    }
}
