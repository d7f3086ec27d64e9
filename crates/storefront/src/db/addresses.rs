//! Customer address repository.

use std::collections::HashMap;

use sqlx::PgPool;

use yemeni_market_core::CustomerId;

use super::RepositoryError;
use crate::models::{Address, AddressDraft};

const ADDRESS_COLUMNS: &str = "id, customer_id, label, street_address, city, state, \
                               postal_code, country, phone, is_default, created_at";

/// Repository for saved addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM addresses
            WHERE customer_id = $1
            ORDER BY is_default DESC, id ASC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Addresses for several customers, grouped by customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customers(
        &self,
        customer_ids: &[CustomerId],
    ) -> Result<HashMap<CustomerId, Vec<Address>>, RepositoryError> {
        let ids: Vec<i32> = customer_ids.iter().map(CustomerId::as_i32).collect();
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM addresses
            WHERE customer_id = ANY($1)
            ORDER BY is_default DESC, id ASC
            "
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<CustomerId, Vec<Address>> = HashMap::new();
        for address in addresses {
            grouped.entry(address.customer_id).or_default().push(address);
        }
        Ok(grouped)
    }

    /// Number of addresses a customer has saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_customer(&self, customer_id: CustomerId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Save an address for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        customer_id: CustomerId,
        draft: &AddressDraft,
    ) -> Result<Address, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO addresses
                (customer_id, label, street_address, city, state, postal_code, country,
                 phone, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(customer_id)
        .bind(&draft.label)
        .bind(&draft.street_address)
        .bind(&draft.city)
        .bind(&draft.state)
        .bind(&draft.postal_code)
        .bind(&draft.country)
        .bind(&draft.phone)
        .bind(draft.is_default)
        .fetch_one(self.pool)
        .await?;

        Ok(address)
    }
}
