//! Product and variant repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use yemeni_market_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{
    AdminProduct, Category, Product, ProductDraft, ProductFilter, ProductListing, ProductVariant,
};

pub(super) const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.name, p.slug, p.description, p.price, \
                               p.stock_quantity, p.image_url, p.images, p.is_active, \
                               p.created_at, p.updated_at";

/// Product joined with its optional category.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductCategoryRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: Option<String>,
    category_slug: Option<String>,
    category_created_at: Option<DateTime<Utc>>,
}

impl ProductCategoryRow {
    pub(super) fn into_parts(self) -> (Product, Option<Category>) {
        let category = match (
            self.product.category_id,
            self.category_name,
            self.category_slug,
            self.category_created_at,
        ) {
            (Some(id), Some(name), Some(slug), Some(created_at)) => Some(Category {
                id,
                name,
                slug,
                created_at,
            }),
            _ => None,
        };
        (self.product, category)
    }
}

/// Stock level line for operator reports.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StockLevel {
    pub id: ProductId,
    pub name: String,
    pub stock_quantity: i32,
    pub is_active: bool,
}

/// Product locked inside an order transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_active: bool,
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products matching the filter, each with its variants.
    ///
    /// Search is a case-insensitive substring match on the product name,
    /// description, category name and variant names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_active(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             LEFT JOIN categories c ON c.id = p.category_id \
             WHERE p.is_active"
        ));

        if let Some(needle) = &filter.search {
            qb.push(" AND (strpos(LOWER(p.name), ")
                .push_bind(needle.clone())
                .push(") > 0 OR strpos(LOWER(p.description), ")
                .push_bind(needle.clone())
                .push(") > 0 OR strpos(LOWER(COALESCE(c.name, '')), ")
                .push_bind(needle.clone())
                .push(
                    ") > 0 OR EXISTS (SELECT 1 FROM product_variants v \
                     WHERE v.product_id = p.id AND strpos(LOWER(v.name), ",
                )
                .push_bind(needle.clone())
                .push(") > 0))");
        }
        if let Some(category) = &filter.category {
            qb.push(" AND c.name = ").push_bind(category.clone());
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND p.price <= ").push_bind(max);
        }
        qb.push(" ORDER BY ").push(filter.sort.order_by());

        let products: Vec<Product> = qb.build_query_as().fetch_all(self.pool).await?;
        self.attach_variants(products).await
    }

    /// Get a product by ID regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Variants of a single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants(&self, id: ProductId) -> Result<Vec<ProductVariant>, RepositoryError> {
        Ok(self
            .variants_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default())
    }

    /// Variants for several products, grouped by product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<ProductVariant>>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let variants = sqlx::query_as::<_, ProductVariant>(
            r"
            SELECT id, product_id, name, price, stock_quantity, created_at
            FROM product_variants
            WHERE product_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(raw_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<ProductId, Vec<ProductVariant>> = HashMap::new();
        for variant in variants {
            grouped.entry(variant.product_id).or_default().push(variant);
        }
        Ok(grouped)
    }

    /// Wrap products as listings with their variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the variant query fails.
    pub async fn attach_variants(
        &self,
        products: Vec<Product>,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let mut variants = self.variants_for(&ids).await?;

        Ok(products
            .into_iter()
            .map(|p| {
                let product_variants = variants.remove(&p.id).unwrap_or_default();
                ProductListing::new(p, product_variants)
            })
            .collect())
    }

    /// Current prices of active products, for pricing a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows: Vec<(ProductId, Decimal)> = sqlx::query_as(
            "SELECT id, price FROM products WHERE id = ANY($1) AND is_active",
        )
        .bind(raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// All products (active or not), newest first, with their category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_admin(&self) -> Result<Vec<AdminProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductCategoryRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS},
                   c.name AS category_name, c.slug AS category_slug,
                   c.created_at AS category_created_at
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (product, categories) = row.into_parts();
                AdminProduct {
                    product,
                    categories,
                }
            })
            .collect())
    }

    /// Get a product with its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_category(
        &self,
        id: ProductId,
    ) -> Result<Option<(Product, Option<Category>)>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductCategoryRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS},
                   c.name AS category_name, c.slug AS category_slug,
                   c.created_at AS category_created_at
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductCategoryRow::into_parts))
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(
        &self,
        draft: &ProductDraft,
        slug: &str,
        category_id: Option<CategoryId>,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products AS p
                (category_id, name, slug, description, price, stock_quantity, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(category_id)
        .bind(&draft.name)
        .bind(slug)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock_quantity)
        .bind(draft.image_url.as_deref())
        .bind(draft.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "product slug already exists"))
    }

    /// Insert a product unless one with the same slug exists.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_if_missing(
        &self,
        draft: &ProductDraft,
        slug: &str,
        category_id: Option<CategoryId>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO products
                (category_id, name, slug, description, price, stock_quantity, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (slug) DO NOTHING
            ",
        )
        .bind(category_id)
        .bind(&draft.name)
        .bind(slug)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock_quantity)
        .bind(draft.image_url.as_deref())
        .bind(draft.is_active)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace a product's editable fields. `None` category disconnects it;
    /// a missing image URL keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        category_id: Option<CategoryId>,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products AS p
            SET name = $2, description = $3, price = $4, stock_quantity = $5,
                is_active = $6, category_id = $7,
                image_url = COALESCE($8, p.image_url), updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock_quantity)
        .bind(draft.is_active)
        .bind(category_id)
        .bind(draft.image_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Soft delete: hide the product from the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn deactivate(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Total number of products, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Set every product's stock and mark it active.
    ///
    /// Returns the number of products updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn reset_all_stock(&self, quantity: i32) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET stock_quantity = $1, is_active = TRUE, updated_at = NOW()",
        )
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Stock level of every product, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_levels(&self) -> Result<Vec<StockLevel>, RepositoryError> {
        let levels = sqlx::query_as::<_, StockLevel>(
            "SELECT id, name, stock_quantity, is_active FROM products ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(levels)
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

/// Lock a product row until the surrounding transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_for_update(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<LockedProduct>, RepositoryError> {
    let product = sqlx::query_as::<_, LockedProduct>(
        "SELECT id, name, price, stock_quantity, is_active FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Take `quantity` units out of stock. The row must already be locked.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails, including when
/// the stock check constraint would be violated.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(quantity)
    .execute(conn)
    .await?;

    Ok(())
}
