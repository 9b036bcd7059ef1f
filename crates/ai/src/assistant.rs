//! The three AI-assisted operations, each with a deterministic fallback.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::client::GenerativeModel;
use crate::draft::ParsedInvoiceDraft;
use crate::error::AiError;
use crate::fallback::parse_invoice_text;
use crate::insights::{InsightsPayload, InvoiceFigures, InvoiceSummary, NO_DATA_INSIGHT};
use crate::normalize::parse_model_json;
use crate::prompt::{insights_prompt, parse_invoice_prompt, reminder_prompt};
use crate::reminder::{ReminderContext, ReminderDraft, tidy_model_reminder};
use crate::response::extract_text;

/// Result of free-text parsing. `ai_error` is set whenever the draft came from the
/// fallback parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutcome {
    #[serde(flatten)]
    pub draft: ParsedInvoiceDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsOutcome {
    pub insights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
}

#[derive(Clone)]
pub struct InvoiceAssistant {
    model: Arc<dyn GenerativeModel>,
    model_name: String,
}

impl InvoiceAssistant {
    pub fn new(model: Arc<dyn GenerativeModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn ask(&self, operation: &'static str, prompt: &str) -> Result<String, AiError> {
        match self.model.generate(&self.model_name, prompt).await {
            Ok(response) => Ok(extract_text(&response)),
            Err(err) => {
                tracing::warn!(operation, model = %self.model_name, error = %err, "model call failed");
                Err(err)
            }
        }
    }

    /// Structured draft from free text. Never fails.
    pub async fn parse_text(&self, text: &str) -> ParseOutcome {
        let raw = match self.ask("parse_text", &parse_invoice_prompt(text)).await {
            Ok(raw) => raw,
            Err(err) => return fallback_parse(text, err),
        };

        let draft = parse_model_json::<JsonValue>(&raw)
            .ok()
            .and_then(ParsedInvoiceDraft::from_model_json);
        match draft {
            Some(draft) => ParseOutcome { draft, ai_error: None },
            None => {
                tracing::warn!(output = %raw, "model returned unusable invoice JSON; using text parser");
                ParseOutcome {
                    draft: parse_invoice_text(text),
                    ai_error: Some("AI returned invalid JSON".to_string()),
                }
            }
        }
    }

    /// Reminder email for one invoice. Never fails.
    pub async fn draft_reminder(&self, ctx: &ReminderContext) -> ReminderDraft {
        let raw = match self.ask("draft_reminder", &reminder_prompt(ctx)).await {
            Ok(raw) => raw,
            Err(err) => return ReminderDraft::fallback(ctx, err.to_string()),
        };

        match tidy_model_reminder(&raw, ctx.business_name()) {
            Some(reminder_text) => ReminderDraft {
                reminder_text,
                ai_error: None,
            },
            None => {
                tracing::warn!("model returned empty or short reminder; using template");
                ReminderDraft::fallback(ctx, AiError::EmptyResponse.to_string())
            }
        }
    }

    /// Dashboard insights for a user's invoices (newest first). An empty set
    /// short-circuits without a model call.
    pub async fn dashboard_insights(&self, invoices: &[InvoiceFigures]) -> InsightsOutcome {
        if invoices.is_empty() {
            return InsightsOutcome {
                insights: vec![NO_DATA_INSIGHT.to_string()],
                ai_error: None,
            };
        }

        let summary = InvoiceSummary::from_invoices(invoices);
        let result = match self.ask("dashboard_insights", &insights_prompt(&summary)).await {
            Ok(raw) => parse_model_json::<InsightsPayload>(&raw).and_then(|payload| {
                payload.into_insights().ok_or(AiError::EmptyResponse)
            }),
            Err(err) => Err(err),
        };

        match result {
            Ok(insights) => InsightsOutcome { insights, ai_error: None },
            Err(err) => {
                tracing::warn!(error = %err, "using computed dashboard insights");
                InsightsOutcome {
                    insights: summary.canned_insights(),
                    ai_error: Some(err.to_string()),
                }
            }
        }
    }
}

fn fallback_parse(text: &str, err: AiError) -> ParseOutcome {
    ParseOutcome {
        draft: parse_invoice_text(text),
        ai_error: Some(err.to_string()),
    }
}
