//! Orders, order items, transactions and invoices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use yemeni_market_core::{
    CustomerId, InvoiceId, InvoiceStatus, OrderId, OrderItemId, OrderStatus, PaymentProvider,
    ProductId, TransactionId, TransactionStatus,
};

use super::account::Customer;

/// An order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub order_number: String,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub payment_method: String,
    pub shipping_address: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order. `price` is the catalog price at checkout time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
}

/// Payment recorded against an order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub provider: PaymentProvider,
    pub provider_tx_id: String,
    #[sqlx(try_from = "String")]
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// An invoice. Every order gets exactly one.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: InvoiceId,
    pub order_id: OrderId,
    pub invoice_number: String,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
}

/// An order with its items, as returned to the customer.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItem>,
}

/// An invoice with its order, as listed in the customer account.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithOrder {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub orders: Order,
}

/// Everything needed to render an invoice document.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub invoice: Invoice,
    pub order: Order,
    pub customer: Option<Customer>,
    pub items: Vec<OrderItem>,
}

/// Order as listed in the back-office.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrder {
    #[serde(flatten)]
    pub order: Order,
    /// `Guest` when the order has no customer.
    pub first_name: String,
    pub last_name: String,
}

/// Order joined with the optional customer name.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AdminOrderRow {
    #[sqlx(flatten)]
    pub order: Order,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<AdminOrderRow> for AdminOrder {
    fn from(row: AdminOrderRow) -> Self {
        Self {
            order: row.order,
            first_name: row
                .first_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Guest".to_owned()),
            last_name: row.last_name.unwrap_or_default(),
        }
    }
}

/// Back-office dashboard figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_products: i64,
}

// =============================================================================
// Checkout input
// =============================================================================

/// A cart line sent by the SPA at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItemInput {
    pub product_id: Option<serde_json::Value>,
    pub quantity: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /api/orders`.
///
/// Client-computed totals and prices are ignored; only product ids and
/// quantities are read from the cart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub items: Vec<CheckoutItemInput>,
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// A validated cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Name the customer saw, used in stock error messages.
    pub display_name: Option<String>,
}

/// A cart line as sent to `POST /api/create-payment-intent`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentItemInput {
    pub id: Option<serde_json::Value>,
    pub quantity: Option<serde_json::Value>,
}

/// Body of `POST /api/create-payment-intent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    #[serde(default)]
    pub items: Vec<PaymentItemInput>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Read an integer sent either as a JSON number or a numeric string.
pub(crate) fn int_from_json(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cart_line(
    product_id: Option<&serde_json::Value>,
    quantity: Option<&serde_json::Value>,
    display_name: Option<String>,
) -> Result<CartLine, &'static str> {
    let product_id = product_id
        .and_then(int_from_json)
        .and_then(|id| i32::try_from(id).ok())
        .ok_or("Invalid product id")?;
    let quantity = quantity
        .and_then(int_from_json)
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q > 0)
        .ok_or("Quantity must be at least 1")?;

    Ok(CartLine {
        product_id: ProductId::new(product_id),
        quantity,
        display_name: display_name.filter(|n| !n.trim().is_empty()),
    })
}

impl CheckoutRequest {
    /// Validate the cart lines.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for an empty cart, a missing product id
    /// or a non-positive quantity.
    pub fn cart_lines(&self) -> Result<Vec<CartLine>, &'static str> {
        if self.items.is_empty() {
            return Err("No items");
        }
        self.items
            .iter()
            .map(|item| {
                cart_line(
                    item.product_id.as_ref(),
                    item.quantity.as_ref(),
                    item.name.clone(),
                )
            })
            .collect()
    }

    /// Customer id sent by the SPA, if it parses.
    #[must_use]
    pub fn claimed_customer_id(&self) -> Option<CustomerId> {
        self.user_id
            .as_ref()
            .and_then(int_from_json)
            .and_then(|id| i32::try_from(id).ok())
            .map(CustomerId::new)
    }

    /// The shipping address as stored on the order: strings as sent, objects
    /// as JSON text.
    #[must_use]
    pub fn shipping_address_text(&self) -> String {
        match &self.shipping_address {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Structured shipping address, whether sent as an object or JSON text.
    #[must_use]
    pub fn shipping_address_fields(&self) -> Option<ShippingAddress> {
        match self.shipping_address.as_ref()? {
            serde_json::Value::String(s) => serde_json::from_str(s).ok(),
            value @ serde_json::Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }

    /// Trimmed contact email, if any.
    #[must_use]
    pub fn contact_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_owned)
    }

    /// Trimmed coupon code, if any.
    #[must_use]
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

impl PaymentIntentRequest {
    /// Validated cart lines. Lines with a bad id or quantity are skipped.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .filter_map(|item| cart_line(item.id.as_ref(), item.quantity.as_ref(), None).ok())
            .collect()
    }
}

/// Shipping address object collected by the checkout form.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ShippingAddress {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ShippingAddress {
    /// Street line for a saved address: `line1` plus `line2` when present.
    ///
    /// Returns `None` unless both `line1` and `city` are filled in.
    #[must_use]
    pub fn street_and_city(&self) -> Option<(String, String)> {
        let line1 = self.line1.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
        let city = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        let street = match self.line2.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(line2) => format!("{line1} {line2}"),
            None => line1.to_owned(),
        };
        Some((street, city.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CheckoutRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        assert_eq!(request(json!({ "items": [] })).cart_lines(), Err("No items"));
        assert_eq!(request(json!({})).cart_lines(), Err("No items"));
    }

    #[test]
    fn test_cart_lines_accept_strings_and_ignore_client_prices() {
        let req = request(json!({
            "items": [
                { "product_id": "3", "quantity": 2, "name": "Sidr Honey", "price": 0.01 },
                { "product_id": 4, "quantity": "1" }
            ],
            "total_price": 0.01
        }));
        let lines = req.cart_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, ProductId::new(3));
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].display_name.as_deref(), Some("Sidr Honey"));
        assert_eq!(lines[1].display_name, None);
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        let req = request(json!({ "items": [{ "product_id": 1, "quantity": 0 }] }));
        assert_eq!(req.cart_lines(), Err("Quantity must be at least 1"));
        let req = request(json!({ "items": [{ "product_id": 1, "quantity": -2 }] }));
        assert!(req.cart_lines().is_err());
    }

    #[test]
    fn test_shipping_address_text_and_fields() {
        let req = request(json!({
            "shipping_address": { "line1": "5 rue Monge", "line2": "Apt 3", "city": "Lyon" }
        }));
        let fields = req.shipping_address_fields().unwrap();
        assert_eq!(
            fields.street_and_city(),
            Some(("5 rue Monge Apt 3".to_owned(), "Lyon".to_owned()))
        );
        assert!(req.shipping_address_text().contains("\"line1\":\"5 rue Monge\""));

        let req = request(json!({ "shipping_address": "5 rue Monge, Lyon" }));
        assert_eq!(req.shipping_address_text(), "5 rue Monge, Lyon");
        assert!(req.shipping_address_fields().is_none());
    }

    #[test]
    fn test_address_without_city_is_not_saved() {
        let address = ShippingAddress {
            line1: Some("5 rue Monge".to_owned()),
            ..ShippingAddress::default()
        };
        assert!(address.street_and_city().is_none());
    }

    #[test]
    fn test_claimed_customer_id() {
        assert_eq!(
            request(json!({ "user_id": "12" })).claimed_customer_id(),
            Some(CustomerId::new(12))
        );
        assert_eq!(request(json!({ "user_id": "abc" })).claimed_customer_id(), None);
    }

    #[test]
    fn test_payment_intent_skips_bad_lines() {
        let req: PaymentIntentRequest = serde_json::from_value(json!({
            "items": [{ "id": 1, "quantity": 2 }, { "id": null, "quantity": 1 }],
            "couponCode": "WELCOME10"
        }))
        .unwrap();
        assert_eq!(req.cart_lines().len(), 1);
        assert_eq!(req.coupon_code.as_deref(), Some("WELCOME10"));
    }

    #[test]
    fn test_stats_serialize_as_numbers() {
        let stats = StoreStats {
            total_revenue: Decimal::new(12345, 2),
            total_orders: 3,
            pending_orders: 1,
            total_products: 8,
        };
        let value = serde_json::to_value(stats).unwrap();
        assert_eq!(value["totalRevenue"], json!(123.45));
        assert_eq!(value["pendingOrders"], 1);
    }
}
