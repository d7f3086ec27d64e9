//! Customer wishlist.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use yemeni_market_core::ProductId;

use crate::db::{RepositoryError, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, RequireCustomer};
use crate::models::ProductListing;
use crate::models::order::int_from_json;
use crate::state::AppState;

/// Body of `POST /api/wishlist/toggle`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    #[serde(default)]
    pub product_id: Option<serde_json::Value>,
}

impl ToggleRequest {
    fn product_id(&self) -> Option<ProductId> {
        self.product_id
            .as_ref()
            .and_then(int_from_json)
            .and_then(|id| i32::try_from(id).ok())
            .map(ProductId::new)
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub added: bool,
    pub message: &'static str,
}

/// The customer's wishlisted products.
///
/// GET /api/wishlist
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    customer: RequireCustomer,
) -> Result<Json<Vec<ProductListing>>> {
    let products = WishlistRepository::new(state.pool())
        .list_products(customer.id)
        .await?;

    Ok(Json(products))
}

/// Add a product to the wishlist, or remove it if already there.
///
/// POST /api/wishlist/toggle
#[instrument(skip(state, customer, body), fields(customer_id = %customer.id))]
pub async fn toggle(
    State(state): State<AppState>,
    customer: RequireCustomer,
    ApiJson(body): ApiJson<ToggleRequest>,
) -> Result<Json<ToggleResponse>> {
    let product_id = body
        .product_id()
        .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))?;

    let added = WishlistRepository::new(state.pool())
        .toggle(customer.id, product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_owned()),
            other => AppError::Database(other),
        })?;

    Ok(Json(ToggleResponse {
        added,
        message: if added {
            "Added to wishlist"
        } else {
            "Removed from wishlist"
        },
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_id_accepts_number_or_string() {
        let req: ToggleRequest = serde_json::from_value(json!({ "productId": 7 })).unwrap();
        assert_eq!(req.product_id(), Some(ProductId::new(7)));
        let req: ToggleRequest = serde_json::from_value(json!({ "productId": "7" })).unwrap();
        assert_eq!(req.product_id(), Some(ProductId::new(7)));
        let req: ToggleRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.product_id(), None);
    }
}
