//! Customer repository.

use sqlx::PgPool;

use yemeni_market_core::{CustomerId, Email};

use super::RepositoryError;
use crate::models::Customer;
use crate::models::account::{AdminCustomer, CustomerStatsRow};

const CUSTOMER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, phone, created_at";

/// Repository for customer accounts.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// Create a customer with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            r"
            INSERT INTO customers (email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "email already exists"))
    }

    /// Replace a customer's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn update_password(
        &self,
        id: CustomerId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE customers SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// All customers, newest first, with their addresses and order totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_with_stats(&self) -> Result<Vec<AdminCustomer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerStatsRow>(
            r"
            SELECT c.id, c.email, c.password_hash, c.first_name, c.last_name, c.phone,
                   c.created_at,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.total_amount), 0) AS total_spent
            FROM customers c
            LEFT JOIN orders o ON o.customer_id = c.id
            GROUP BY c.id
            ORDER BY c.created_at DESC, c.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<CustomerId> = rows.iter().map(|r| r.customer.id).collect();
        let mut addresses = super::AddressRepository::new(self.pool)
            .list_for_customers(&ids)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| AdminCustomer {
                addresses: addresses.remove(&row.customer.id).unwrap_or_default(),
                customer: row.customer,
                order_count: row.order_count,
                total_spent: row.total_spent,
            })
            .collect())
    }
}
