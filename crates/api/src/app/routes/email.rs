use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use invoicer_ai::split_subject;
use invoicer_infra::OutgoingEmail;

use crate::app::dto::{self, MessageResponse, SendReminderRequest};
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::UserContext;

const DEFAULT_SENDER_NAME: &str = "Your Business";

/// `"Name" <address>` with quotes stripped from the display name.
fn from_header(sender_name: Option<String>, address: &str) -> String {
    let name = dto::required(sender_name)
        .map(|n| n.replace('"', ""))
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string());
    format!("\"{}\" <{}>", name.trim(), address)
}

pub async fn send_reminder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    JsonBody(req): JsonBody<SendReminderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(to), Some(client_name), Some(reminder_text)) = (
        dto::required(req.client_email),
        dto::required(req.client_name),
        dto::required(req.reminder_text),
    ) else {
        return Err(ApiError::bad_request("Missing required fields."));
    };

    let (subject, text) = split_subject(&reminder_text);
    let email = OutgoingEmail {
        to,
        subject,
        text,
        from: from_header(req.sender_name, &services.sender_address),
    };

    services.mailer.send(email).await?;
    tracing::info!(user_id = %ctx.user_id(), client = %client_name, "reminder email sent");

    Ok(Json(MessageResponse::new("Email sent successfully!")))
}
