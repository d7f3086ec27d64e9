//! Invoice repository.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use yemeni_market_core::{CustomerId, InvoiceId, InvoiceStatus, OrderId};

use super::orders::ORDER_COLUMNS;
use super::{CustomerRepository, OrderRepository, RepositoryError};
use crate::models::{Invoice, InvoiceDocument, InvoiceWithOrder, Order};

const INVOICE_COLUMNS: &str = "i.id, i.order_id, i.invoice_number, i.amount, i.status, i.issued_at";

/// Repository for invoices.
pub struct InvoiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InvoiceRepository<'a> {
    /// Create a new invoice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's invoices, newest first, each with its order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` if an invoice's order is missing.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<InvoiceWithOrder>, RepositoryError> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r"
            SELECT {INVOICE_COLUMNS}
            FROM invoices i
            JOIN orders o ON o.id = i.order_id
            WHERE o.customer_id = $1
            ORDER BY i.issued_at DESC, i.id DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        let order_ids: Vec<i32> = invoices.iter().map(|i| i.order_id.as_i32()).collect();
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ANY($1)"
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;
        let mut orders: HashMap<OrderId, Order> = orders.into_iter().map(|o| (o.id, o)).collect();

        invoices
            .into_iter()
            .map(|invoice| {
                let order = orders.remove(&invoice.order_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "invoice {} references missing order {}",
                        invoice.invoice_number, invoice.order_id
                    ))
                })?;
                Ok(InvoiceWithOrder {
                    invoice,
                    orders: order,
                })
            })
            .collect()
    }

    /// Everything needed to render an invoice: the invoice, its order, the
    /// ordering customer (if any) and the order lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_document(
        &self,
        id: InvoiceId,
    ) -> Result<Option<InvoiceDocument>, RepositoryError> {
        let Some(invoice) = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"
        ))
        .bind(invoice.order_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "invoice {} references missing order {}",
                invoice.invoice_number, invoice.order_id
            ))
        })?;

        let customer = match order.customer_id {
            Some(customer_id) => CustomerRepository::new(self.pool).get_by_id(customer_id).await?,
            None => None,
        };
        let items = OrderRepository::new(self.pool)
            .items_for(&[order.id])
            .await?
            .remove(&order.id)
            .unwrap_or_default();

        Ok(Some(InvoiceDocument {
            invoice,
            order,
            customer,
            items,
        }))
    }
}

/// Issue the paid invoice for a freshly placed order.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order already has an invoice.
pub async fn insert(
    conn: &mut PgConnection,
    order_id: OrderId,
    invoice_number: &str,
    amount: Decimal,
) -> Result<Invoice, RepositoryError> {
    sqlx::query_as::<_, Invoice>(&format!(
        r"
        INSERT INTO invoices AS i (order_id, invoice_number, amount, status)
        VALUES ($1, $2, $3, $4)
        RETURNING {INVOICE_COLUMNS}
        "
    ))
    .bind(order_id)
    .bind(invoice_number)
    .bind(amount)
    .bind(InvoiceStatus::Paid.as_str())
    .fetch_one(conn)
    .await
    .map_err(|e| RepositoryError::unique_violation(e, "invoice already issued"))
}
