//! Coupon repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use yemeni_market_core::{CouponId, DiscountType};

use super::RepositoryError;
use crate::models::Coupon;

const COUPON_COLUMNS: &str = "id, code, discount_type, value, min_order_amount, \
                              expiration_date, usage_limit, used_count, is_active, created_at";

/// Fields for a new coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon<'a> {
    pub code: &'a str,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub usage_limit: i32,
}

/// Repository for discount coupons.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a coupon by its exact code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(coupon)
    }

    /// Insert a coupon unless the code already exists.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_if_missing(&self, coupon: &NewCoupon<'_>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO coupons
                (code, discount_type, value, min_order_amount, expiration_date, usage_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (code) DO NOTHING
            ",
        )
        .bind(coupon.code)
        .bind(coupon.discount_type.as_str())
        .bind(coupon.value)
        .bind(coupon.min_order_amount)
        .bind(coupon.expiration_date)
        .bind(coupon.usage_limit)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Lock a coupon row by code until the surrounding transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_by_code(
    conn: &mut PgConnection,
    code: &str,
) -> Result<Option<Coupon>, RepositoryError> {
    let coupon = sqlx::query_as::<_, Coupon>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1 FOR UPDATE"
    ))
    .bind(code)
    .fetch_optional(conn)
    .await?;

    Ok(coupon)
}

/// Count one more redemption of a coupon.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn increment_usage(conn: &mut PgConnection, id: CouponId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}
