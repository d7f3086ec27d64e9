//! Review repository.

use sqlx::PgPool;

use yemeni_market_core::{CustomerId, ProductId};

use super::RepositoryError;
use crate::models::review::ReviewAuthorRow;
use crate::models::{Review, ReviewWithAuthor};

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first, with the reviewer's name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewAuthorRow>(
            r"
            SELECT r.id, r.product_id, r.customer_id, r.rating, r.comment, r.is_verified,
                   r.created_at, c.first_name, c.last_name
            FROM reviews r
            JOIN customers c ON c.id = r.customer_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ReviewWithAuthor::from).collect())
    }

    /// Store a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        product_id: ProductId,
        customer_id: CustomerId,
        rating: i32,
        comment: &str,
        is_verified: bool,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            r"
            INSERT INTO reviews (product_id, customer_id, rating, comment, is_verified)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, customer_id, rating, comment, is_verified, created_at
            ",
        )
        .bind(product_id)
        .bind(customer_id)
        .bind(rating)
        .bind(comment)
        .bind(is_verified)
        .fetch_one(self.pool)
        .await?;

        Ok(review)
    }
}
