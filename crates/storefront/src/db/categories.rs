//! Category repository.

use sqlx::PgPool;

use yemeni_market_core::slugify;

use super::RepositoryError;
use crate::models::Category;

/// Repository for product categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a category by exact name, creating it (slug from the name) if
    /// it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another category already uses
    /// the derived slug.
    pub async fn find_or_create(&self, name: &str) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO categories (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug, created_at
            ",
        )
        .bind(name)
        .bind(slugify(name))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "category slug already exists"))
    }
}
