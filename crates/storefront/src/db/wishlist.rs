//! Wishlist repository.

use sqlx::PgPool;

use yemeni_market_core::{CustomerId, ProductId};

use super::products::{PRODUCT_COLUMNS, ProductCategoryRow};
use super::{ProductRepository, RepositoryError};
use crate::models::ProductListing;

/// Repository for customer wishlists.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products on a customer's wishlist, most recently added first, with
    /// variants and category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_products(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductCategoryRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS},
                   c.name AS category_name, c.slug AS category_slug,
                   c.created_at AS category_created_at
            FROM wishlist w
            JOIN products p ON p.id = w.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE w.customer_id = $1
            ORDER BY w.created_at DESC, w.id DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        let (products, categories): (Vec<_>, Vec<_>) =
            rows.into_iter().map(ProductCategoryRow::into_parts).unzip();
        let listings = ProductRepository::new(self.pool)
            .attach_variants(products)
            .await?;

        Ok(listings
            .into_iter()
            .zip(categories)
            .map(|(listing, category)| listing.with_category(category))
            .collect())
    }

    /// Add the product if absent, remove it if present.
    ///
    /// Returns `true` when the product was added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when adding a product that does
    /// not exist.
    pub async fn toggle(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let removed = sqlx::query("DELETE FROM wishlist WHERE customer_id = $1 AND product_id = $2")
            .bind(customer_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        if ProductRepository::new(self.pool)
            .get_by_id(product_id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            INSERT INTO wishlist (customer_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (customer_id, product_id) DO NOTHING
            ",
        )
        .bind(customer_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(true)
    }
}
