//! Store settings repository.

use std::collections::HashMap;

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::StoreConfigEntry;

const ENTRY_COLUMNS: &str = r#"key, value, is_public, description, "group", "type", updated_at"#;

/// Repository for `store_config` key/value rows.
pub struct StoreConfigRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreConfigRepository<'a> {
    /// Create a new store settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every row, ordered by group then key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<StoreConfigEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, StoreConfigEntry>(&format!(
            r#"SELECT {ENTRY_COLUMNS} FROM store_config ORDER BY "group" ASC, key ASC"#
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Public keys and their values, safe to hand to the browser.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn public_values(&self) -> Result<HashMap<String, String>, RepositoryError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM store_config WHERE is_public")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    /// Every key and its value, for the in-memory settings snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all_values(&self) -> Result<HashMap<String, String>, RepositoryError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM store_config")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Insert or update a row. New keys land in group `custom` with type
    /// `text`; existing rows keep their group and type, and keep their
    /// visibility and description when those are not given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        is_public: Option<bool>,
        description: Option<&str>,
    ) -> Result<StoreConfigEntry, RepositoryError> {
        let entry = sqlx::query_as::<_, StoreConfigEntry>(&format!(
            r#"
            INSERT INTO store_config (key, value, is_public, description, "group", "type")
            VALUES ($1, $2, COALESCE($3, FALSE), $4, 'custom', 'text')
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                is_public = COALESCE($3, store_config.is_public),
                description = COALESCE(EXCLUDED.description, store_config.description),
                updated_at = NOW()
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(key)
        .bind(value)
        .bind(is_public)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        Ok(entry)
    }

    /// Change the value of a key, keeping its other attributes. Unknown keys
    /// are created as private `custom` text settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO store_config (key, value, is_public, "group", "type")
            VALUES ($1, $2, FALSE, 'custom', 'text')
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
