//! Back-office account repository.

use sqlx::PgPool;

use yemeni_market_core::{AdminRole, Email};

use super::RepositoryError;
use crate::models::Admin;

const ADMIN_COLUMNS: &str = "id, email, password_hash, name, role, created_at, updated_at";

/// Repository for admin accounts.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or the stored
    /// role is not a known role.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Admin>, RepositoryError> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(admin)
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        name: &str,
        role: AdminRole,
    ) -> Result<Admin, RepositoryError> {
        sqlx::query_as::<_, Admin>(&format!(
            r"
            INSERT INTO admins (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "admin email already exists"))
    }
}
