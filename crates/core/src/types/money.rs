//! Money arithmetic and checkout totals.
//!
//! All amounts are `rust_decimal::Decimal` in the store currency (USD) and are
//! rounded half away from zero to two decimals at every step that is shown to
//! a customer. The payment intent and the order transaction both call
//! [`CheckoutTotals::compute`], so the amount charged always matches the
//! amount recorded on the order and invoice.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::status::DiscountType;

/// VAT applied to the discounted subtotal (20%).
pub const TAX_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Orders with a subtotal strictly above this ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Flat shipping fee below the free-shipping threshold.
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(15, 0, 0, false, 0);

/// Round an amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an amount to integer minor units (cents) for the payment provider.
///
/// Returns `None` if the amount does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (round_money(amount) * Decimal::ONE_HUNDRED).to_i64()
}

/// A priced cart line: unit price times quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineAmount {
    #[must_use]
    pub const fn new(unit_price: Decimal, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// Line total, rounded to cents.
    #[must_use]
    pub fn total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

/// A validated coupon discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Percentage of the subtotal (e.g. `10` for 10%).
    Percentage(Decimal),
    /// Fixed amount off the subtotal.
    Fixed(Decimal),
}

impl Discount {
    /// Build a discount from a coupon's type and value.
    #[must_use]
    pub const fn from_coupon(kind: DiscountType, value: Decimal) -> Self {
        match kind {
            DiscountType::Percentage => Self::Percentage(value),
            DiscountType::Fixed => Self::Fixed(value),
        }
    }

    /// Amount taken off `subtotal`, never negative and never above the subtotal.
    #[must_use]
    pub fn amount_off(&self, subtotal: Decimal) -> Decimal {
        let raw = match self {
            Self::Percentage(pct) => subtotal * *pct / Decimal::ONE_HUNDRED,
            Self::Fixed(amount) => *amount,
        };
        round_money(raw.max(Decimal::ZERO).min(subtotal))
    }
}

/// Totals for a cart at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CheckoutTotals {
    /// Compute totals for the given lines and optional coupon discount.
    ///
    /// Shipping is decided on the pre-discount subtotal; tax applies to the
    /// discounted subtotal. An empty cart costs nothing.
    #[must_use]
    pub fn compute(lines: &[LineAmount], discount: Option<&Discount>) -> Self {
        let subtotal: Decimal = lines.iter().map(LineAmount::total).sum();
        let discount = discount.map_or(Decimal::ZERO, |d| d.amount_off(subtotal));
        let taxable = (subtotal - discount).max(Decimal::ZERO);
        let tax = round_money(taxable * TAX_RATE);
        let shipping = if subtotal.is_zero() || subtotal > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_FEE
        };

        Self {
            subtotal,
            discount,
            tax,
            shipping,
            total: round_money(taxable + tax + shipping),
        }
    }

    /// Whether shipping was waived.
    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_constants() {
        assert_eq!(TAX_RATE, dec("0.20"));
        assert_eq!(FREE_SHIPPING_THRESHOLD, dec("100"));
        assert_eq!(FLAT_SHIPPING_FEE, dec("15"));
    }

    #[test]
    fn test_small_cart_pays_shipping() {
        let totals = CheckoutTotals::compute(&[LineAmount::new(dec("45.00"), 2)], None);
        assert_eq!(totals.subtotal, dec("90.00"));
        assert_eq!(totals.tax, dec("18.00"));
        assert_eq!(totals.shipping, dec("15"));
        assert_eq!(totals.total, dec("123.00"));
        assert!(!totals.has_free_shipping());
    }

    #[test]
    fn test_threshold_is_strict() {
        let totals = CheckoutTotals::compute(&[LineAmount::new(dec("100.00"), 1)], None);
        assert_eq!(totals.shipping, dec("15"));

        let totals = CheckoutTotals::compute(&[LineAmount::new(dec("100.01"), 1)], None);
        assert!(totals.has_free_shipping());
    }

    #[test]
    fn test_large_cart_ships_free() {
        let totals = CheckoutTotals::compute(&[LineAmount::new(dec("150.00"), 1)], None);
        assert_eq!(totals.tax, dec("30.00"));
        assert_eq!(totals.total, dec("180.00"));
    }

    #[test]
    fn test_percentage_coupon_reduces_tax_base() {
        let discount = Discount::from_coupon(DiscountType::Percentage, dec("10"));
        let totals =
            CheckoutTotals::compute(&[LineAmount::new(dec("45.00"), 2)], Some(&discount));
        assert_eq!(totals.discount, dec("9.00"));
        assert_eq!(totals.tax, dec("16.20"));
        // Shipping is decided before the discount
        assert_eq!(totals.shipping, dec("15"));
        assert_eq!(totals.total, dec("112.20"));
    }

    #[test]
    fn test_fixed_coupon_is_capped_at_subtotal() {
        let discount = Discount::Fixed(dec("500"));
        let totals =
            CheckoutTotals::compute(&[LineAmount::new(dec("20.00"), 1)], Some(&discount));
        assert_eq!(totals.discount, dec("20.00"));
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, dec("15"));
    }

    #[test]
    fn test_negative_discount_is_ignored() {
        let discount = Discount::Fixed(dec("-5"));
        assert_eq!(discount.amount_off(dec("10")), Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart_is_free() {
        let totals = CheckoutTotals::compute(&[], None);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(round_money(dec("0.125")), dec("0.13"));
        assert_eq!(round_money(dec("2.344")), dec("2.34"));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(dec("112.20")), Some(11220));
        assert_eq!(to_minor_units(dec("0.005")), Some(1));
    }
}
