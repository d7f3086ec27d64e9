//! Public store settings.

use std::collections::HashMap;

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::StoreConfigRepository;
use crate::error::Result;
use crate::state::AppState;

/// Settings the SPA may read (shop name, Stripe publishable key, ...).
///
/// GET /api/config
#[instrument(skip(state))]
pub async fn public(State(state): State<AppState>) -> Result<Json<HashMap<String, String>>> {
    let values = StoreConfigRepository::new(state.pool())
        .public_values()
        .await?;

    Ok(Json(values))
}
