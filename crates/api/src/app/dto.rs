use serde::{Deserialize, Serialize};

use invoicer_ai::{InvoiceFigures, ReminderContext};
use invoicer_auth::UserProfile;
use invoicer_invoicing::Invoice;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParseTextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    #[serde(default)]
    pub invoice_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReminderRequest {
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub reminder_text: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

/// `Some(trimmed)` when present and non-blank.
pub fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -------------------------
// Domain mapping helpers
// -------------------------

pub fn reminder_context(invoice: &Invoice) -> ReminderContext {
    ReminderContext {
        client_name: Some(invoice.bill_to.client_name.clone()),
        invoice_number: Some(invoice.invoice_number.clone()),
        amount: Some(invoice.total),
        due_date: invoice.due_date,
        business_name: Some(invoice.bill_from.business_name.clone()),
        paid: invoice.is_paid(),
    }
}

pub fn invoice_figures(invoice: &Invoice) -> InvoiceFigures {
    InvoiceFigures {
        invoice_number: invoice.invoice_number.clone(),
        total: invoice.total,
        paid: invoice.is_paid(),
    }
}
