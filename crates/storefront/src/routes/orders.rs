//! Order placement and order history.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use yemeni_market_core::OrderId;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::{ApiJson, OptionalCustomer, RequireCustomer};
use crate::models::{CheckoutRequest, OrderWithItems};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub success: bool,
    pub order_id: OrderId,
    pub order_number: String,
}

/// Place an order after the card payment was confirmed by the SPA.
///
/// POST /api/orders
#[instrument(skip(state, body), fields(customer_id = ?customer))]
pub async fn create(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<Json<OrderCreated>> {
    let placed = CheckoutService::new(state.pool(), state.email())
        .place_order(&body, customer)
        .await?;

    Ok(Json(OrderCreated {
        success: true,
        order_id: placed.order.id,
        order_number: placed.order.order_number,
    }))
}

/// The customer's orders, newest first, with items.
///
/// GET /api/orders
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    customer: RequireCustomer,
) -> Result<Json<Vec<OrderWithItems>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;

    Ok(Json(orders))
}
