//! Order repository.
//!
//! Orders are only ever created inside the checkout transaction, so the
//! insert functions take a connection rather than the pool.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use yemeni_market_core::{
    CustomerId, OrderId, OrderStatus, PaymentProvider, ProductId, TransactionStatus,
};

use super::RepositoryError;
use crate::models::order::AdminOrderRow;
use crate::models::{AdminOrder, Order, OrderItem, OrderWithItems, StoreStats, Transaction};

pub(crate) const ORDER_COLUMNS: &str = "o.id, o.customer_id, o.order_number, o.subtotal, \
     o.discount_total, o.tax_total, o.shipping_cost, o.total_amount, o.coupon_code, o.status, \
     o.payment_method, o.shipping_address, o.contact_email, o.contact_phone, o.created_at, \
     o.updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, price, total_price";

/// Header of an order about to be placed.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub customer_id: Option<CustomerId>,
    pub order_number: &'a str,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<&'a str>,
    pub payment_method: &'a str,
    pub shipping_address: &'a str,
    pub contact_email: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
}

/// A priced order line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
}

/// An order whose status was just changed, with the address to notify.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order: Order,
    pub notify_email: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct StatusChangeRow {
    #[sqlx(flatten)]
    order: Order,
    customer_email: Option<String>,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders, newest first, each with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            WHERE o.customer_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let order_items = items.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, order_items }
            })
            .collect())
    }

    /// Items of several orders, grouped by order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_for(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id ASC"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }

    /// Every order, newest first, with the customer's name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_admin(&self) -> Result<Vec<AdminOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminOrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, c.first_name, c.last_name
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(AdminOrder::from).collect())
    }

    /// Set an order's status.
    ///
    /// The returned notification address is the customer's account email,
    /// falling back to the contact email given at checkout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let row = sqlx::query_as::<_, StatusChangeRow>(&format!(
            r"
            WITH o AS (
                UPDATE orders SET status = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {ORDER_COLUMNS}, c.email AS customer_email
            FROM o
            LEFT JOIN customers c ON c.id = o.customer_id
            "
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let notify_email = row
            .customer_email
            .or_else(|| row.order.contact_email.clone())
            .filter(|e| !e.is_empty());

        Ok(StatusChange {
            order: row.order,
            notify_email,
        })
    }

    /// Dashboard figures across all orders and products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        let (total_revenue, total_orders, pending_orders, total_products): (
            Decimal,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r"
            SELECT
                (SELECT COALESCE(SUM(total_amount), 0) FROM orders),
                (SELECT COUNT(*) FROM orders),
                (SELECT COUNT(*) FROM orders WHERE status = $1),
                (SELECT COUNT(*) FROM products)
            ",
        )
        .bind(OrderStatus::Processing.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(StoreStats {
            total_revenue,
            total_orders,
            pending_orders,
            total_products,
        })
    }

    /// Whether the customer has any order containing the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_has_ordered(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM order_items i
                JOIN orders o ON o.id = i.order_id
                WHERE o.customer_id = $1 AND i.product_id = $2
            )
            ",
        )
        .bind(customer_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}

// =============================================================================
// Transaction-scoped inserts
// =============================================================================

/// Insert an order header with status `Processing`.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on a duplicate order number.
pub async fn insert(conn: &mut PgConnection, order: &NewOrder<'_>) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO orders AS o
            (customer_id, order_number, subtotal, discount_total, tax_total, shipping_cost,
             total_amount, coupon_code, status, payment_method, shipping_address,
             contact_email, contact_phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order.customer_id)
    .bind(order.order_number)
    .bind(order.subtotal)
    .bind(order.discount_total)
    .bind(order.tax_total)
    .bind(order.shipping_cost)
    .bind(order.total_amount)
    .bind(order.coupon_code)
    .bind(OrderStatus::Processing.as_str())
    .bind(order.payment_method)
    .bind(order.shipping_address)
    .bind(order.contact_email)
    .bind(order.contact_phone)
    .fetch_one(conn)
    .await
    .map_err(|e| RepositoryError::unique_violation(e, "order number already exists"))
}

/// Insert the lines of an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    items: &[NewOrderItem],
) -> Result<Vec<OrderItem>, RepositoryError> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as::<_, OrderItem>(&format!(
            r"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.total_price)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

/// Record a completed payment against an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_transaction(
    conn: &mut PgConnection,
    order_id: OrderId,
    amount: Decimal,
    provider_tx_id: &str,
) -> Result<Transaction, RepositoryError> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r"
        INSERT INTO transactions (order_id, amount, provider, provider_tx_id, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, order_id, amount, provider, provider_tx_id, status, created_at
        ",
    )
    .bind(order_id)
    .bind(amount)
    .bind(PaymentProvider::Stripe.as_str())
    .bind(provider_tx_id)
    .bind(TransactionStatus::Completed.as_str())
    .fetch_one(conn)
    .await?;

    Ok(transaction)
}
