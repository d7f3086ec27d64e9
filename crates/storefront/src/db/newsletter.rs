//! Newsletter subscriber repository.

use sqlx::PgPool;

use yemeni_market_core::Email;

use super::RepositoryError;
use crate::models::Subscriber;

/// Repository for newsletter subscribers.
pub struct NewsletterRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NewsletterRepository<'a> {
    /// Create a new newsletter repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether the address is already subscribed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM newsletter_subscribers WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Add an active subscriber.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the address subscribed
    /// concurrently.
    pub async fn subscribe(&self, email: &Email, lang: &str) -> Result<Subscriber, RepositoryError> {
        sqlx::query_as::<_, Subscriber>(
            r"
            INSERT INTO newsletter_subscribers (email, is_active, lang)
            VALUES ($1, TRUE, $2)
            RETURNING id, email, is_active, lang, created_at
            ",
        )
        .bind(email)
        .bind(lang)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "already subscribed"))
    }
}
