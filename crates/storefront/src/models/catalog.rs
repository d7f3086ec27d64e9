//! Catalog types: categories, products and variants.
//!
//! JSON field names follow the database columns. Related records are nested
//! under the table name (`categories`, `variants`) because that is the shape
//! the SPA reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use yemeni_market_core::{CategoryId, ProductId, VariantId};

use super::review::ReviewWithAuthor;

/// Placeholder image used when a product has no `image_url`.
const PLACEHOLDER_IMAGE_BASE: &str = "https://placehold.co/500x700/D4AF37/FFFFFF?text=";

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub images: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The product image, or a generated placeholder showing its name.
    #[must_use]
    pub fn display_image_url(&self) -> String {
        self.image_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{PLACEHOLDER_IMAGE_BASE}{}",
                    urlencoding::encode(&self.name)
                )
            })
    }
}

/// A product variant (size, roast, ...).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Option<Decimal>,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Product as shown in listings and the wishlist.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    #[serde(rename = "imageUrl")]
    pub image_url_resolved: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Category>,
}

impl ProductListing {
    #[must_use]
    pub fn new(product: Product, variants: Vec<ProductVariant>) -> Self {
        let image_url_resolved = product.display_image_url();
        Self {
            product,
            variants,
            image_url_resolved,
            categories: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.categories = category;
        self
    }
}

/// Product detail page payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    #[serde(rename = "imageUrl")]
    pub image_url_resolved: String,
    pub categories: Option<Category>,
    pub reviews: Vec<ReviewWithAuthor>,
}

/// Product as listed in the back-office, including its category.
#[derive(Debug, Clone, Serialize)]
pub struct AdminProduct {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Option<Category>,
}

/// Sort order for the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    Newest,
    /// Highest id first.
    #[default]
    Default,
}

impl ProductSort {
    /// Parse the `sort` query value. Unknown values use the default order.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("name_asc") => Self::NameAsc,
            Some("name_desc") => Self::NameDesc,
            Some("newest") => Self::Newest,
            _ => Self::Default,
        }
    }

    /// SQL `ORDER BY` clause for this sort.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::PriceAsc => "p.price ASC, p.id DESC",
            Self::PriceDesc => "p.price DESC, p.id DESC",
            Self::NameAsc => "p.name ASC",
            Self::NameDesc => "p.name DESC",
            Self::Newest => "p.created_at DESC",
            Self::Default => "p.id DESC",
        }
    }
}

/// Raw query parameters of `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Validated product listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Lowercased search needle.
    pub search: Option<String>,
    /// Exact category name.
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let price = |value: Option<String>| {
            non_empty(value).and_then(|v| v.parse::<Decimal>().ok())
        };

        Self {
            search: non_empty(query.search).map(|s| s.to_lowercase()),
            category: non_empty(query.category).filter(|c| c != "All"),
            min_price: price(query.min_price),
            max_price: price(query.max_price),
            sort: ProductSort::from_query(query.sort.as_deref()),
        }
    }
}

/// Admin create/update payload for a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub stock: Option<serde_json::Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Validated product fields ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_name: Option<String>,
    pub is_active: bool,
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Validate the payload.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message when the name is missing or the price
    /// is missing, negative, too large or not a number.
    pub fn into_draft(self) -> Result<ProductDraft, &'static str> {
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or("Product name is required")?;

        let price = self
            .price
            .as_ref()
            .and_then(decimal_from_json)
            .ok_or("A valid price is required")?;
        if price.is_sign_negative() {
            return Err("Price cannot be negative");
        }
        // `products.price` is NUMERIC(10,2)
        if price.round_dp(2) > Decimal::new(9_999_999_999, 2) {
            return Err("Price is too large");
        }

        // Unparsable stock counts as zero
        let stock_quantity = self
            .stock
            .as_ref()
            .and_then(decimal_from_json)
            .and_then(|d| d.trunc().to_i32())
            .unwrap_or(0)
            .max(0);

        Ok(ProductDraft {
            name,
            description: self.description.unwrap_or_default(),
            price,
            stock_quantity,
            category_name: self
                .category_name
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
            is_active: self.is_active.unwrap_or(true),
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

/// Accept numbers sent either as JSON numbers or numeric strings.
pub(crate) fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(name: &str, image_url: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: None,
            name: name.to_owned(),
            slug: "x".to_owned(),
            description: String::new(),
            price: Decimal::new(15000, 2),
            stock_quantity: 3,
            image_url: image_url.map(str::to_owned),
            images: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_placeholder_image_encodes_name() {
        let p = product("Royal Sidr Honey", None);
        assert_eq!(
            p.display_image_url(),
            "https://placehold.co/500x700/D4AF37/FFFFFF?text=Royal%20Sidr%20Honey"
        );
        let p = product("Honey", Some("/img/honey.jpg"));
        assert_eq!(p.display_image_url(), "/img/honey.jpg");
    }

    #[test]
    fn test_listing_serializes_flat_with_image_url() {
        let listing = ProductListing::new(product("Coffee", None), vec![]);
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["name"], "Coffee");
        assert_eq!(value["price"], "150.00");
        assert!(value["variants"].as_array().unwrap().is_empty());
        assert!(value["imageUrl"].as_str().unwrap().ends_with("text=Coffee"));
        assert!(value.get("categories").is_none());
    }

    #[test]
    fn test_filter_from_query() {
        let filter = ProductFilter::from(ProductQuery {
            search: Some("  SIDR ".to_owned()),
            min_price: Some("10".to_owned()),
            max_price: Some("abc".to_owned()),
            category: Some("All".to_owned()),
            sort: Some("price_desc".to_owned()),
        });
        assert_eq!(filter.search.as_deref(), Some("sidr"));
        assert_eq!(filter.min_price, Some(Decimal::from(10)));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.category, None);
        assert_eq!(filter.sort, ProductSort::PriceDesc);
    }

    #[test]
    fn test_unknown_sort_is_default() {
        assert_eq!(ProductSort::from_query(Some("random")), ProductSort::Default);
        assert_eq!(ProductSort::from_query(None).order_by(), "p.id DESC");
    }

    #[test]
    fn test_product_input_validation() {
        let input: ProductInput = serde_json::from_value(json!({
            "name": "Haraz Coffee",
            "price": "45.5",
            "stock": "12",
            "category_name": "Coffee"
        }))
        .unwrap();
        let draft = input.into_draft().unwrap();
        assert_eq!(draft.price, Decimal::new(455, 1));
        assert_eq!(draft.stock_quantity, 12);
        assert_eq!(draft.category_name.as_deref(), Some("Coffee"));
        assert!(draft.is_active);

        let input: ProductInput = serde_json::from_value(json!({ "name": "x", "price": -1 })).unwrap();
        assert_eq!(input.into_draft().unwrap_err(), "Price cannot be negative");

        let input: ProductInput = serde_json::from_value(json!({ "price": 3 })).unwrap();
        assert_eq!(input.into_draft().unwrap_err(), "Product name is required");
    }

    #[test]
    fn test_price_must_fit_the_column() {
        let draft = |price: serde_json::Value| {
            serde_json::from_value::<ProductInput>(json!({ "name": "Saffron", "price": price }))
                .unwrap()
                .into_draft()
        };
        assert_eq!(
            draft(json!("99999999.99")).unwrap().price,
            Decimal::new(9_999_999_999, 2)
        );
        assert_eq!(draft(json!("100000000")).unwrap_err(), "Price is too large");
        assert_eq!(draft(json!(1e12)).unwrap_err(), "Price is too large");
        // Rounds up past the limit when stored
        assert_eq!(draft(json!("99999999.999")).unwrap_err(), "Price is too large");
    }

    #[test]
    fn test_bad_stock_is_zero() {
        let input: ProductInput =
            serde_json::from_value(json!({ "name": "x", "price": 1, "stock": "lots" })).unwrap();
        assert_eq!(input.into_draft().unwrap().stock_quantity, 0);
    }
}
