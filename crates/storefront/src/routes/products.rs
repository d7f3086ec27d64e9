//! Catalog and review routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use yemeni_market_core::ProductId;

use crate::db::{OrderRepository, ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, RequireCustomer};
use crate::models::{
    NewReview, ProductDetail, ProductFilter, ProductListing, ProductQuery, Review,
    ReviewWithAuthor,
};
use crate::state::AppState;

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}

/// List active products.
///
/// GET /api/products?search&min_price&max_price&category&sort
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductListing>>> {
    let filter = ProductFilter::from(query);
    let products = ProductRepository::new(state.pool())
        .list_active(&filter)
        .await?;

    Ok(Json(products))
}

/// Product detail with variants, category and reviews.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let id: ProductId = id.parse().map_err(|_| product_not_found())?;
    let products = ProductRepository::new(state.pool());

    let (product, category) = products
        .get_with_category(id)
        .await?
        .ok_or_else(product_not_found)?;
    let variants = products.variants(id).await?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(Json(ProductDetail {
        image_url_resolved: product.display_image_url(),
        product,
        variants,
        categories: category,
        reviews,
    }))
}

/// Reviews of a product, newest first.
///
/// GET /api/products/{id}/reviews
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewWithAuthor>>> {
    let id: ProductId = id.parse().map_err(|_| product_not_found())?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(Json(reviews))
}

/// Post a review. It is marked verified when the customer has bought the
/// product.
///
/// POST /api/products/{id}/reviews
#[instrument(skip(state, customer, body), fields(customer_id = %customer.id))]
pub async fn create_review(
    State(state): State<AppState>,
    customer: RequireCustomer,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    let id: ProductId = id.parse().map_err(|_| product_not_found())?;
    let rating = body
        .rating()
        .ok_or_else(|| AppError::BadRequest("Rating must be between 1 and 5".to_owned()))?;

    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(product_not_found)?;

    let is_verified = OrderRepository::new(state.pool())
        .customer_has_ordered(customer.id, id)
        .await?;

    let review = ReviewRepository::new(state.pool())
        .create(
            id,
            customer.id,
            rating,
            body.comment.as_deref().unwrap_or_default().trim(),
            is_verified,
        )
        .await?;

    tracing::info!(product_id = %id, review_id = %review.id, is_verified, "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}
