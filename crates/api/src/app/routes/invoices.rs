use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use invoicer_core::{DomainError, InvoiceId};
use invoicer_invoicing::{Invoice, InvoiceUpdate, NewInvoice};

use crate::app::dto::MessageResponse;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_invoice).get(list_invoices))
        .route("/:id", get(get_invoice).put(update_invoice).delete(delete_invoice))
}

/// Load an invoice owned by the caller. Malformed ids, missing invoices and
/// other users' invoices all read as 404.
pub(crate) async fn owned_invoice(
    services: &AppServices,
    ctx: &UserContext,
    raw_id: &str,
) -> Result<Invoice, ApiError> {
    let id: InvoiceId = raw_id
        .trim()
        .parse()
        .map_err(|_| DomainError::not_found("Invoice"))?;
    let invoice = services
        .invoices
        .find_by_id(id)
        .await?
        .ok_or(DomainError::not_found("Invoice"))?;
    invoice.ensure_owned_by(ctx.user_id()).inspect_err(|_| {
        tracing::debug!(invoice_id = %id, user_id = %ctx.user_id(), "invoice belongs to another user");
    })?;
    Ok(invoice)
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    JsonBody(input): JsonBody<NewInvoice>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = Invoice::create(ctx.user_id(), input, Utc::now())?;
    let invoice = services.invoices.insert(invoice).await?;
    tracing::info!(invoice_id = %invoice.id, user_id = %ctx.user_id(), total = invoice.total, "invoice created");
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = services.invoices.list_for_owner(ctx.user_id()).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = owned_invoice(&services, &ctx, &id).await?;
    Ok(Json(invoice))
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<InvoiceUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let mut invoice = owned_invoice(&services, &ctx, &id).await?;
    invoice.apply_update(update, Utc::now())?;
    let invoice = services.invoices.update(invoice).await?;
    tracing::info!(invoice_id = %invoice.id, "invoice updated");
    Ok(Json(invoice))
}

pub async fn delete_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = owned_invoice(&services, &ctx, &id).await?;
    if !services.invoices.delete(invoice.id).await? {
        return Err(DomainError::not_found("Invoice").into());
    }
    tracing::info!(invoice_id = %invoice.id, "invoice deleted");
    Ok(Json(MessageResponse::new("Invoice deleted successfully")))
}
