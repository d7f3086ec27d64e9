//! Invoice PDF download.

use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use yemeni_market_core::{AccountKind, InvoiceId};

use crate::db::InvoiceRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::invoice_pdf::render_invoice;
use crate::state::AppState;

/// Render an invoice as a PDF attachment.
///
/// Customers may only download invoices of their own orders; admins may
/// download any.
///
/// GET /api/invoices/{id}/pdf
#[instrument(skip(state, claims), fields(sub = %claims.sub))]
pub async fn pdf(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let not_found = || AppError::NotFound("Invoice not found".to_owned());
    let id: InvoiceId = id.parse().map_err(|_| not_found())?;

    let document = InvoiceRepository::new(state.pool())
        .get_document(id)
        .await?
        .ok_or_else(not_found)?;

    let allowed = claims.kind == AccountKind::Admin
        || (claims.customer_id().is_some() && document.order.customer_id == claims.customer_id());
    if !allowed {
        return Err(AppError::Forbidden(
            "Unauthorized access to this invoice".to_owned(),
        ));
    }

    let bytes = render_invoice(&document)?;
    let disposition = format!(
        "attachment; filename=invoice-{}.pdf",
        document.invoice.invoice_number
    );

    Ok((
        [(CONTENT_TYPE, "application/pdf".to_owned()), (CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response())
}
