//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yemeni_market_core::{CustomerId, ProductId, ReviewId};

/// A review row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub rating: i32,
    pub comment: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Reviewer name shown next to a review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewAuthor {
    pub first_name: String,
    pub last_name: String,
}

/// A review together with its author, nested under `customers`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub customers: ReviewAuthor,
}

/// Flat join row used by the repository.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewAuthorRow {
    #[sqlx(flatten)]
    pub review: Review,
    pub first_name: String,
    pub last_name: String,
}

impl From<ReviewAuthorRow> for ReviewWithAuthor {
    fn from(row: ReviewAuthorRow) -> Self {
        Self {
            review: row.review,
            customers: ReviewAuthor {
                first_name: row.first_name,
                last_name: row.last_name,
            },
        }
    }
}

/// Body of `POST /api/products/{id}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: Option<serde_json::Value>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewReview {
    /// Validated rating in `1..=5`.
    #[must_use]
    pub fn rating(&self) -> Option<i32> {
        let rating = match self.rating.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64()?,
            serde_json::Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        (1..=5)
            .contains(&rating)
            .then(|| i32::try_from(rating).ok())
            .flatten()
    }
}
