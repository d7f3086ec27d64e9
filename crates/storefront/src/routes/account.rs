//! Customer account: saved addresses and invoices.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::{AddressRepository, InvoiceRepository};
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, RequireCustomer};
use crate::models::{Address, AddressInput, InvoiceWithOrder};
use crate::state::AppState;

/// Saved addresses, default first.
///
/// GET /api/customer/address
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn addresses(
    State(state): State<AppState>,
    customer: RequireCustomer,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;

    Ok(Json(addresses))
}

/// Save a new address.
///
/// POST /api/customer/address
#[instrument(skip(state, customer, body), fields(customer_id = %customer.id))]
pub async fn create_address(
    State(state): State<AppState>,
    customer: RequireCustomer,
    ApiJson(body): ApiJson<AddressInput>,
) -> Result<Json<Address>> {
    let draft = body
        .into_draft()
        .ok_or_else(|| AppError::BadRequest("Required fields missing".to_owned()))?;

    let address = AddressRepository::new(state.pool())
        .create(customer.id, &draft)
        .await?;

    Ok(Json(address))
}

/// Invoices of the customer's orders, newest first.
///
/// GET /api/customer/invoices
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn invoices(
    State(state): State<AppState>,
    customer: RequireCustomer,
) -> Result<Json<Vec<InvoiceWithOrder>>> {
    let invoices = InvoiceRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;

    Ok(Json(invoices))
}
