//! Order placement.
//!
//! The whole order is written in one database transaction: product rows and
//! the coupon row are locked with `SELECT ... FOR UPDATE`, so two checkouts
//! racing for the last unit serialize in Postgres and the loser sees the
//! decremented stock. Prices always come from the catalog; the cart only
//! contributes product ids and quantities.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use yemeni_market_core::{CheckoutTotals, CustomerId, Discount, LineAmount, ProductId};

use crate::db::{
    self, AddressRepository, CouponRepository, CustomerRepository, ProductRepository,
    RepositoryError,
};
use crate::db::orders::{NewOrder, NewOrderItem};
use crate::error::add_breadcrumb;
use crate::models::{
    AddressDraft, CartLine, CheckoutRequest, CouponRejection, Order, OrderItem, ShippingAddress,
};
use crate::services::email::EmailService;

/// Payment method recorded on every order.
const PAYMENT_METHOD: &str = "Stripe";

/// Errors that abort an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart failed validation.
    #[error("{0}")]
    InvalidCart(&'static str),

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Insufficient stock for {name}. Only {available} left.")]
    InsufficientStock { name: String, available: i32 },

    #[error("{0}")]
    Coupon(#[from] CouponRejection),

    /// A quantity or amount does not fit the database column.
    #[error("Amount out of range")]
    OutOfRange,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl CheckoutError {
    /// Whether the customer can fix this by changing the cart.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repository(_))
    }
}

/// A committed order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub totals: CheckoutTotals,
}

/// Prices carts and places orders.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    email: &'a EmailService,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService) -> Self {
        Self { pool, email }
    }

    /// Price a cart for the payment page.
    ///
    /// Unknown and inactive products are skipped. The coupon, if any, is
    /// checked but not consumed.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Coupon` if the coupon cannot be redeemed.
    pub async fn quote(
        &self,
        lines: &[CartLine],
        coupon_code: Option<&str>,
    ) -> Result<CheckoutTotals, CheckoutError> {
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        let prices = ProductRepository::new(self.pool).active_prices(&ids).await?;
        let amounts = priced_lines(lines, &prices);

        let discount = match coupon_code {
            Some(code) => {
                let coupon = CouponRepository::new(self.pool)
                    .get_by_code(code)
                    .await?
                    .ok_or(CouponRejection::Unknown)?;
                let subtotal = CheckoutTotals::compute(&amounts, None).subtotal;
                Some(coupon.redeem(Utc::now(), subtotal)?)
            }
            None => None,
        };

        Ok(CheckoutTotals::compute(&amounts, discount.as_ref()))
    }

    /// Place an order.
    ///
    /// `authenticated` is the customer behind a valid bearer token; it wins
    /// over the `user_id` in the body, which is only trusted when that
    /// customer exists.
    ///
    /// # Errors
    ///
    /// Returns a client error for an invalid cart, a missing product, short
    /// stock or a rejected coupon. Nothing is written in that case.
    pub async fn place_order(
        &self,
        request: &CheckoutRequest,
        authenticated: Option<CustomerId>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let lines = request.cart_lines().map_err(CheckoutError::InvalidCart)?;
        let customer_id = match authenticated {
            Some(id) => Some(id),
            None => self.known_customer(request.claimed_customer_id()).await?,
        };

        let now = Utc::now();
        let millis = now.timestamp_millis();
        let order_number = order_number(millis, rand::rng().random_range(0..1000));
        let contact_email = request.contact_email();
        let coupon_code = request.coupon_code();

        let mut tx = self.pool.begin().await?;

        let mut amounts = Vec::with_capacity(lines.len());
        let mut new_items = Vec::with_capacity(lines.len());
        for line in &lines {
            let label = line
                .display_name
                .clone()
                .unwrap_or_else(|| line.product_id.to_string());
            let quantity = i32::try_from(line.quantity).map_err(|_| CheckoutError::OutOfRange)?;

            let product = db::products::lock_for_update(&mut tx, line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| CheckoutError::ProductNotFound(label.clone()))?;
            if product.stock_quantity < quantity {
                return Err(CheckoutError::InsufficientStock {
                    name: label,
                    available: product.stock_quantity,
                });
            }
            db::products::decrement_stock(&mut tx, product.id, quantity).await?;

            let amount = LineAmount::new(product.price, line.quantity);
            new_items.push(NewOrderItem {
                product_id: product.id,
                product_name: product.name,
                quantity,
                price: product.price,
                total_price: amount.total(),
            });
            amounts.push(amount);
        }

        let mut discount: Option<Discount> = None;
        if let Some(code) = coupon_code {
            let coupon = db::coupons::lock_by_code(&mut tx, code)
                .await?
                .ok_or(CouponRejection::Unknown)?;
            let subtotal = CheckoutTotals::compute(&amounts, None).subtotal;
            discount = Some(coupon.redeem(now, subtotal)?);
            db::coupons::increment_usage(&mut tx, coupon.id).await?;
        }

        let totals = CheckoutTotals::compute(&amounts, discount.as_ref());

        let shipping_address = request.shipping_address_text();
        let order = db::orders::insert(
            &mut tx,
            &NewOrder {
                customer_id,
                order_number: &order_number,
                subtotal: totals.subtotal,
                discount_total: totals.discount,
                tax_total: totals.tax,
                shipping_cost: totals.shipping,
                total_amount: totals.total,
                coupon_code,
                payment_method: PAYMENT_METHOD,
                shipping_address: &shipping_address,
                contact_email: contact_email.as_deref(),
                contact_phone: request.phone.as_deref().filter(|p| !p.trim().is_empty()),
            },
        )
        .await?;

        let items = db::orders::insert_items(&mut tx, order.id, &new_items).await?;

        let provider_tx_id = request
            .payment_intent_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("manual-{millis}"));
        db::orders::insert_transaction(&mut tx, order.id, totals.total, &provider_tx_id).await?;
        db::invoices::insert(&mut tx, order.id, &invoice_number(&order_number), totals.total)
            .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %totals.total,
            items = items.len(),
            "Order placed"
        );
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_number", order.order_number.as_str())]),
        );

        if let Some(customer_id) = customer_id {
            self.save_first_address(customer_id, request).await;
        }

        if let Some(to) = contact_email.as_deref()
            && let Err(e) = self
                .email
                .send_order_confirmation(to, &order.order_number, &items, &totals)
                .await
        {
            tracing::error!(error = %e, order_number = %order.order_number, "Failed to send order confirmation");
        }

        Ok(PlacedOrder {
            order,
            items,
            totals,
        })
    }

    async fn known_customer(
        &self,
        claimed: Option<CustomerId>,
    ) -> Result<Option<CustomerId>, RepositoryError> {
        let Some(id) = claimed else {
            return Ok(None);
        };
        let customer = CustomerRepository::new(self.pool).get_by_id(id).await?;
        Ok(customer.map(|c| c.id))
    }

    /// Keep the shipping address on the profile when the customer has none.
    /// Failures are logged and never affect the order.
    async fn save_first_address(&self, customer_id: CustomerId, request: &CheckoutRequest) {
        let Some(draft) = request
            .shipping_address_fields()
            .and_then(|address| first_address_draft(&address, request.phone.as_deref()))
        else {
            return;
        };

        let addresses = AddressRepository::new(self.pool);
        let result = match addresses.count_for_customer(customer_id).await {
            Ok(0) => addresses.create(customer_id, &draft).await.map(Some),
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        };
        match result {
            Ok(Some(address)) => {
                tracing::info!(customer_id = %customer_id, address_id = %address.id, "Saved address from checkout");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, customer_id = %customer_id, "Failed to save checkout address");
            }
        }
    }
}

/// Price cart lines against the catalog, skipping unknown products.
fn priced_lines(lines: &[CartLine], prices: &HashMap<ProductId, Decimal>) -> Vec<LineAmount> {
    lines
        .iter()
        .filter_map(|line| {
            prices
                .get(&line.product_id)
                .map(|price| LineAmount::new(*price, line.quantity))
        })
        .collect()
}

fn order_number(unix_millis: i64, suffix: u32) -> String {
    format!("ORD-{unix_millis}-{suffix}")
}

fn invoice_number(order_number: &str) -> String {
    format!("INV-{order_number}")
}

/// Default `Home` address built from the checkout form.
fn first_address_draft(
    address: &ShippingAddress,
    phone: Option<&str>,
) -> Option<AddressDraft> {
    let (street_address, city) = address.street_and_city()?;
    let field = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    Some(AddressDraft {
        label: "Home".to_owned(),
        street_address,
        city,
        state: field(&address.state).unwrap_or_default(),
        postal_code: field(&address.postal_code).unwrap_or_default(),
        country: field(&address.country).unwrap_or_else(|| "FR".to_owned()),
        phone: phone.map(str::trim).unwrap_or_default().to_owned(),
        is_default: true,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_invoice_numbers() {
        let number = order_number(1_717_171_717_000, 42);
        assert_eq!(number, "ORD-1717171717000-42");
        assert_eq!(invoice_number(&number), "INV-ORD-1717171717000-42");
    }

    #[test]
    fn test_priced_lines_skip_unknown_products() {
        let lines = vec![
            CartLine {
                product_id: ProductId::new(1),
                quantity: 2,
                display_name: None,
            },
            CartLine {
                product_id: ProductId::new(99),
                quantity: 1,
                display_name: None,
            },
        ];
        let prices = HashMap::from([(ProductId::new(1), Decimal::new(2500, 2))]);

        let amounts = priced_lines(&lines, &prices);
        assert_eq!(amounts, vec![LineAmount::new(Decimal::new(2500, 2), 2)]);
        assert_eq!(
            CheckoutTotals::compute(&amounts, None).total,
            Decimal::new(7500, 2)
        );
    }

    #[test]
    fn test_error_messages() {
        let err = CheckoutError::ProductNotFound("Sidr Honey".to_owned());
        assert_eq!(err.to_string(), "Product Sidr Honey not found");

        let err = CheckoutError::InsufficientStock {
            name: "Sidr Honey".to_owned(),
            available: 1,
        };
        assert_eq!(err.to_string(), "Insufficient stock for Sidr Honey. Only 1 left.");
        assert!(err.is_client_error());

        let err = CheckoutError::from(CouponRejection::Expired);
        assert_eq!(err.to_string(), "Coupon expired");
        assert!(!CheckoutError::Repository(RepositoryError::NotFound).is_client_error());
    }

    #[test]
    fn test_first_address_defaults() {
        let address = ShippingAddress {
            line1: Some("12 rue des Lilas".to_owned()),
            line2: Some("Bât B".to_owned()),
            city: Some("Paris".to_owned()),
            postal_code: Some("75011".to_owned()),
            ..ShippingAddress::default()
        };
        let draft = first_address_draft(&address, Some(" 0612345678 ")).unwrap();
        assert_eq!(draft.label, "Home");
        assert_eq!(draft.street_address, "12 rue des Lilas Bât B");
        assert_eq!(draft.country, "FR");
        assert_eq!(draft.state, "");
        assert_eq!(draft.phone, "0612345678");
        assert!(draft.is_default);
    }

    #[test]
    fn test_first_address_requires_city() {
        let address = ShippingAddress {
            line1: Some("12 rue des Lilas".to_owned()),
            ..ShippingAddress::default()
        };
        assert!(first_address_draft(&address, None).is_none());
    }
}
