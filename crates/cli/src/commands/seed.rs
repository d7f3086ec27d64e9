//! Seed the database with starter data.
//!
//! Both seeds are idempotent: existing rows (matched by email, category
//! name, product slug or coupon code) are left untouched.

use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use yemeni_market_core::{AdminRole, DiscountType, Email};
use yemeni_market_storefront::db::coupons::NewCoupon;
use yemeni_market_storefront::db::{
    AdminRepository, CategoryRepository, CouponRepository, ProductRepository,
};
use yemeni_market_storefront::models::ProductDraft;
use yemeni_market_storefront::services::auth::hash_password;

use super::{CliError, connect};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.yaml");

const WELCOME_COUPON: &str = "WELCOME10";

#[derive(Debug, Deserialize)]
struct CatalogSeed {
    #[serde(default)]
    admin: Option<SeedAdmin>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedAdmin {
    email: String,
    name: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    slug: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: String,
    price: Decimal,
    #[serde(default)]
    stock_quantity: i32,
    #[serde(default)]
    image_url: Option<String>,
}

impl SeedProduct {
    fn draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock_quantity: self.stock_quantity,
            category_name: self.category.clone(),
            is_active: true,
            image_url: self.image_url.clone(),
        }
    }
}

/// List every problem in a catalog file.
fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let categories: HashSet<&str> = seed.categories.iter().map(String::as_str).collect();
    let mut slugs = HashSet::new();

    for product in &seed.products {
        if product.name.trim().is_empty() {
            errors.push(format!("product '{}' has no name", product.slug));
        }
        if !slugs.insert(product.slug.as_str()) {
            errors.push(format!("duplicate slug '{}'", product.slug));
        }
        if product.price <= Decimal::ZERO {
            errors.push(format!("product '{}' must have a positive price", product.slug));
        }
        if product.stock_quantity < 0 {
            errors.push(format!("product '{}' has negative stock", product.slug));
        }
        if let Some(category) = product.category.as_deref()
            && !categories.contains(category)
        {
            errors.push(format!(
                "product '{}' uses unlisted category '{category}'",
                product.slug
            ));
        }
    }

    errors
}

fn parse_catalog(content: &str) -> Result<CatalogSeed, CliError> {
    let seed: CatalogSeed =
        serde_yaml::from_str(content).map_err(|e| CliError::CatalogFile(e.to_string()))?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(CliError::CatalogFile(format!(
            "{} validation errors found",
            errors.len()
        )));
    }
    Ok(seed)
}

/// Seed the admin account, categories and products.
///
/// # Arguments
///
/// * `file_path` - YAML catalog to load; the built-in catalog when `None`
pub async fn catalog(file_path: Option<&str>) -> Result<(), CliError> {
    let content = match file_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading catalog from file");
            tokio::fs::read_to_string(Path::new(path))
                .await
                .map_err(|e| CliError::CatalogFile(format!("{path}: {e}")))?
        }
        None => BUILTIN_CATALOG.to_owned(),
    };
    let seed = parse_catalog(&content)?;
    tracing::info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Catalog validated"
    );

    let pool = connect().await?;

    if let Some(admin) = &seed.admin {
        let email =
            Email::parse(&admin.email).map_err(|_| CliError::InvalidEmail(admin.email.clone()))?;
        let admins = AdminRepository::new(&pool);
        if admins.get_by_email(&email).await?.is_some() {
            tracing::info!("Admin {} already exists", email);
        } else {
            let hash = hash_password(&admin.password)?;
            admins
                .create(&email, &hash, &admin.name, AdminRole::SuperAdmin)
                .await?;
            tracing::warn!("Admin {} created with the seed password, change it", email);
        }
    }

    let categories = CategoryRepository::new(&pool);
    let mut category_ids = std::collections::HashMap::new();
    for name in &seed.categories {
        let category = categories.find_or_create(name).await?;
        category_ids.insert(name.as_str(), category.id);
    }

    let products = ProductRepository::new(&pool);
    let mut created = 0;
    for product in &seed.products {
        let category_id = product
            .category
            .as_deref()
            .and_then(|c| category_ids.get(c).copied());
        if products
            .create_if_missing(&product.draft(), &product.slug, category_id)
            .await?
        {
            created += 1;
            tracing::info!(slug = %product.slug, "Product created");
        }
    }

    tracing::info!(
        created,
        skipped = seed.products.len() - created,
        "Seeding complete"
    );
    Ok(())
}

fn welcome_coupon_row() -> NewCoupon<'static> {
    let expires = NaiveDate::from_ymd_opt(2030, 12, 31)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt));

    NewCoupon {
        code: WELCOME_COUPON,
        discount_type: DiscountType::Percentage,
        value: Decimal::TEN,
        min_order_amount: None,
        expiration_date: expires,
        usage_limit: 1000,
    }
}

/// Seed the `WELCOME10` coupon: 10 % off, 1000 uses, valid through 2030.
pub async fn welcome_coupon() -> Result<(), CliError> {
    let pool = connect().await?;

    if CouponRepository::new(&pool)
        .create_if_missing(&welcome_coupon_row())
        .await?
    {
        tracing::info!("Coupon {WELCOME_COUPON} created");
    } else {
        tracing::info!("Coupon {WELCOME_COUPON} already exists");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let seed = parse_catalog(BUILTIN_CATALOG).unwrap();
        assert_eq!(seed.categories, ["Honey", "Coffee", "Spices", "Gifts"]);
        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[0].price, Decimal::new(15000, 2));
        assert_eq!(seed.admin.unwrap().email, "admin@yemeni.market");
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let seed: CatalogSeed = serde_yaml::from_str(
            r#"
categories: [Honey]
products:
  - { name: A, slug: a, price: "1.00", category: Tea }
  - { name: B, slug: a, price: "0" }
"#,
        )
        .unwrap();
        let errors = validate(&seed);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("unlisted category 'Tea'"));
        assert!(errors[1].contains("duplicate slug"));
        assert!(errors[2].contains("positive price"));
    }

    #[test]
    fn test_welcome_coupon_terms() {
        let coupon = welcome_coupon_row();
        assert_eq!(coupon.code, "WELCOME10");
        assert_eq!(coupon.discount_type, DiscountType::Percentage);
        assert_eq!(coupon.usage_limit, 1000);
        assert_eq!(
            coupon.expiration_date.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2030, 12, 31).unwrap()
        );
    }
}
