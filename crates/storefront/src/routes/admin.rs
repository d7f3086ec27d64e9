//! Back-office API. Every handler requires an admin token.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use yemeni_market_core::{CategoryId, OrderId, OrderStatus, ProductId, unique_slug};

use crate::db::{
    CategoryRepository, CustomerRepository, OrderRepository, ProductRepository,
    RepositoryError, StoreConfigRepository,
};
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, RequireAdmin};
use crate::models::{
    AdminCustomer, AdminOrder, AdminProduct, Order, Product, ProductDraft, ProductInput,
    StoreConfigEntry, StoreConfigUpdate, StoreStats,
};
use crate::state::AppState;

/// Body of `PUT /api/admin/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn parse_status(value: Option<&str>) -> Result<OrderStatus> {
    value
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::BadRequest("Invalid status".to_owned()))
}

/// Dashboard figures.
///
/// GET /api/admin/stats
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn stats(State(state): State<AppState>, admin: RequireAdmin) -> Result<Json<StoreStats>> {
    let stats = OrderRepository::new(state.pool()).stats().await?;
    Ok(Json(stats))
}

/// All orders, newest first.
///
/// GET /api/admin/orders
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn orders(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<Json<Vec<AdminOrder>>> {
    let orders = OrderRepository::new(state.pool()).list_for_admin().await?;
    Ok(Json(orders))
}

/// Change an order's status. Moving to `Shipped` emails the customer in the
/// background.
///
/// PUT /api/admin/orders/{id}/status
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Order>> {
    let status = parse_status(body.status.as_deref())?;
    let id: OrderId = id
        .parse()
        .map_err(|_| AppError::NotFound("Order not found".to_owned()))?;

    let change = OrderRepository::new(state.pool())
        .update_status(id, status)
        .await?;
    tracing::info!(order_number = %change.order.order_number, status = %status.as_str(), "Order status updated");

    if status == OrderStatus::Shipped
        && let Some(to) = change.notify_email
    {
        let email = state.email().clone();
        let order_number = change.order.order_number.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_order_shipped(&to, &order_number).await {
                tracing::error!(error = %e, order_number = %order_number, "Failed to send shipped email");
            }
        });
    }

    Ok(Json(change.order))
}

/// Every product, active or not, newest first.
///
/// GET /api/admin/products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn products(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<Json<Vec<AdminProduct>>> {
    let products = ProductRepository::new(state.pool()).list_for_admin().await?;
    Ok(Json(products))
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}

fn product_error(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => product_not_found(),
        other => AppError::Database(other),
    }
}

/// Find or create the draft's category.
async fn resolve_category(state: &AppState, draft: &ProductDraft) -> Result<Option<CategoryId>> {
    let Some(name) = draft.category_name.as_deref() else {
        return Ok(None);
    };
    let category = CategoryRepository::new(state.pool())
        .find_or_create(name)
        .await?;
    Ok(Some(category.id))
}

/// Create a product.
///
/// POST /api/admin/products
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn create_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiJson(body): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let mut draft = body.into_draft().map_err(|m| AppError::BadRequest(m.to_owned()))?;
    draft.is_active = true;

    let category_id = resolve_category(&state, &draft).await?;
    let slug = unique_slug(&draft.name, Utc::now().timestamp_millis());
    let product = ProductRepository::new(state.pool())
        .create(&draft, &slug, category_id)
        .await?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok(Json(product))
}

/// Update a product. An empty category name removes the category.
///
/// PUT /api/admin/products/{id}
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let id: ProductId = id
        .parse()
        .map_err(|_| product_not_found())?;
    let draft = body.into_draft().map_err(|m| AppError::BadRequest(m.to_owned()))?;

    let products = ProductRepository::new(state.pool());
    // Checked first so an unknown id never creates the category
    if products.get_by_id(id).await?.is_none() {
        return Err(product_not_found());
    }
    let category_id = resolve_category(&state, &draft).await?;
    let product = products
        .update(id, &draft, category_id)
        .await
        .map_err(product_error)?;

    tracing::info!(product_id = %product.id, is_active = product.is_active, "Product updated");
    Ok(Json(product))
}

/// Hide a product from the catalog. Order history keeps referencing it.
///
/// DELETE /api/admin/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id: ProductId = id
        .parse()
        .map_err(|_| product_not_found())?;
    ProductRepository::new(state.pool())
        .deactivate(id)
        .await
        .map_err(product_error)?;

    tracing::info!(product_id = %id, "Product deactivated");
    Ok(Json(MessageResponse {
        message: "Product deactivated successfully",
    }))
}

/// Customers with addresses and order totals.
///
/// GET /api/admin/customers
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn customers(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<Json<Vec<AdminCustomer>>> {
    let customers = CustomerRepository::new(state.pool())
        .list_with_stats()
        .await?;
    Ok(Json(customers))
}

/// All settings rows, including private ones.
///
/// GET /api/admin/config
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn config(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<Json<Vec<StoreConfigEntry>>> {
    let entries = StoreConfigRepository::new(state.pool()).list().await?;
    Ok(Json(entries))
}

/// Create or update a setting, then reload the in-memory snapshot.
///
/// PUT /api/admin/config
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, key = ?body.key))]
pub async fn update_config(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiJson(body): ApiJson<StoreConfigUpdate>,
) -> Result<Json<StoreConfigEntry>> {
    let key = body
        .key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::BadRequest("Key is required".to_owned()))?;

    let entry = StoreConfigRepository::new(state.pool())
        .upsert(
            key,
            &body.value_text(),
            body.is_public,
            body.description.as_deref(),
        )
        .await?;

    state.settings().reload(state.pool()).await?;
    tracing::info!(key = %entry.key, "Store setting updated");

    Ok(Json(entry))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(Some("Shipped")).unwrap(), OrderStatus::Shipped);
        assert!(parse_status(Some("shipped")).is_err());
        assert!(parse_status(Some("Lost")).is_err());
        assert!(parse_status(None).is_err());
    }
}
