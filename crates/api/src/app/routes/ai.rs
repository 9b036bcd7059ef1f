use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
};

use crate::app::dto::{self, ParseTextRequest, ReminderRequest};
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::routes::invoices::owned_invoice;
use crate::app::services::AppServices;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/parse-text", post(parse_text))
        .route("/generate-reminder", post(generate_reminder))
        .route("/dashboard-summary", get(dashboard_summary))
}

pub async fn parse_text(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(req): JsonBody<ParseTextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Text is required"))?;

    let outcome = services.assistant.parse_text(&text).await;
    if let Some(err) = &outcome.ai_error {
        tracing::info!(ai_error = %err, items = outcome.draft.items.len(), "parse-text served from fallback parser");
    }
    Ok(Json(outcome))
}

pub async fn generate_reminder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    JsonBody(req): JsonBody<ReminderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice_id = dto::required(req.invoice_id).ok_or_else(|| ApiError::bad_request("Invoice ID is required"))?;

    let invoice = owned_invoice(&services, &ctx, &invoice_id).await?;
    let draft = services.assistant.draft_reminder(&dto::reminder_context(&invoice)).await;
    Ok(Json(draft))
}

pub async fn dashboard_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<impl IntoResponse, ApiError> {
    let figures = services
        .invoices
        .list_for_owner(ctx.user_id())
        .await?
        .iter()
        .map(dto::invoice_figures)
        .collect::<Vec<_>>();

    let outcome = services.assistant.dashboard_insights(&figures).await;
    Ok(Json(outcome))
}
