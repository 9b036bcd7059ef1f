//! Reminder email drafts: the deterministic template and the clean-up applied to
//! model output.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::normalize::strip_code_fences;

pub const DEFAULT_CLIENT_NAME: &str = "Valued Client";
pub const DEFAULT_INVOICE_NUMBER: &str = "Unknown";
pub const DEFAULT_BUSINESS_NAME: &str = "Our Company";
pub const DEFAULT_SUBJECT: &str = "Invoice Reminder";

/// Model drafts shorter than this (after trimming) are treated as empty.
const MIN_DRAFT_CHARS: usize = 10;

const CLOSING_LINES: [&str; 3] = ["best regards,", "sincerely,", "thank you,"];

lazy_static! {
    static ref SUBJECT_LINE: Regex = Regex::new(r"(?im)^[ \t]*Subject:[ \t]*(.*)$").unwrap();
}

/// Invoice facts a reminder is written from. Missing facts fall back to neutral
/// wording.
#[derive(Debug, Clone, Default)]
pub struct ReminderContext {
    pub client_name: Option<String>,
    pub invoice_number: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub business_name: Option<String>,
    pub paid: bool,
}

impl ReminderContext {
    pub fn client_name(&self) -> &str {
        non_blank(&self.client_name).unwrap_or(DEFAULT_CLIENT_NAME)
    }

    pub fn invoice_number(&self) -> &str {
        non_blank(&self.invoice_number).unwrap_or(DEFAULT_INVOICE_NUMBER)
    }

    pub fn business_name(&self) -> &str {
        non_blank(&self.business_name).unwrap_or(DEFAULT_BUSINESS_NAME)
    }

    /// `1100.00`, or `an amount` when unknown.
    pub fn amount(&self) -> String {
        match self.amount {
            Some(amount) if amount.is_finite() => format!("{amount:.2}"),
            _ => "an amount".to_string(),
        }
    }

    pub fn due_date(&self) -> String {
        self.due_date
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| "the due date".to_string())
    }

    /// Dollar-prefixed amount; the sign is dropped when the amount is unknown.
    fn amount_phrase(&self) -> String {
        match self.amount {
            Some(amount) if amount.is_finite() => format!("${amount:.2}"),
            _ => self.amount(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Response body of the reminder endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDraft {
    pub reminder_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
}

impl ReminderDraft {
    pub fn fallback(ctx: &ReminderContext, ai_error: impl Into<String>) -> Self {
        Self {
            reminder_text: fallback_reminder(ctx),
            ai_error: Some(ai_error.into()),
        }
    }
}

/// The deterministic reminder. It ends with labelled `Invoice for:` and
/// `Amount due:` lines so the free-text parser can read it back.
pub fn fallback_reminder(ctx: &ReminderContext) -> String {
    let number = ctx.invoice_number();
    let client = ctx.client_name();
    let amount = ctx.amount_phrase();
    let state = if ctx.paid {
        "is marked as paid".to_string()
    } else {
        format!("is due on {}", ctx.due_date())
    };

    format!(
        "Subject: Friendly reminder - Invoice #{number} due\n\
         \n\
         Hi {client},\n\
         \n\
         I hope you're well. This is a friendly reminder that invoice #{number} for {amount} {state}. \
         Please let us know if you have any questions or need additional information.\n\
         \n\
         Invoice for: {client}\n\
         Amount due: {amount}\n\
         \n\
         Thank you for your prompt attention.\n\
         \n\
         Best regards,\n\
         {business}",
        business = ctx.business_name(),
    )
}

/// Clean a model-written reminder. Returns `None` when nothing usable remains.
///
/// Anything before the first `Subject:` line is dropped, and the business name is
/// signed under the closing line when the model left it out.
pub fn tidy_model_reminder(raw: &str, business_name: &str) -> Option<String> {
    let text = strip_code_fences(raw);
    let text = match SUBJECT_LINE.find(&text) {
        Some(m) => text[m.start()..].trim().to_string(),
        None => text,
    };
    if text.chars().count() < MIN_DRAFT_CHARS {
        return None;
    }
    if text.contains(business_name) {
        return Some(text);
    }
    Some(sign_with(&text, business_name))
}

fn sign_with(text: &str, business_name: &str) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let closing = lines
        .iter()
        .rposition(|line| CLOSING_LINES.contains(&line.trim().to_lowercase().as_str()));

    match closing {
        Some(idx) => {
            let next = idx + 1;
            let is_placeholder = lines.get(next).is_some_and(|l| {
                let l = l.trim();
                l.starts_with('[') && l.ends_with(']')
            });
            if is_placeholder {
                lines[next] = business_name.to_string();
            } else {
                lines.insert(next, business_name.to_string());
            }
        }
        None => lines.push(business_name.to_string()),
    }
    lines.join("\n")
}

/// Split a reminder into `(subject, body)`. The first `Subject:` line is the
/// subject; the rest, trimmed, is the body.
pub fn split_subject(text: &str) -> (String, String) {
    let Some(caps) = SUBJECT_LINE.captures(text) else {
        return (DEFAULT_SUBJECT.to_string(), text.trim().to_string());
    };
    let (Some(line), Some(value)) = (caps.get(0), caps.get(1)) else {
        return (DEFAULT_SUBJECT.to_string(), text.trim().to_string());
    };

    let subject = value.as_str().trim();
    let subject = if subject.is_empty() { DEFAULT_SUBJECT } else { subject };
    let body = format!("{}{}", &text[..line.start()], &text[line.end()..]);
    (subject.to_string(), body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::parse_invoice_text;
    use chrono::TimeZone;

    fn context() -> ReminderContext {
        ReminderContext {
            client_name: Some("Acme Corp".to_string()),
            invoice_number: Some("INV-7".to_string()),
            amount: Some(1100.0),
            due_date: Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).single(),
            business_name: Some("Pixel Forge".to_string()),
            paid: false,
        }
    }

    #[test]
    fn fallback_mentions_invoice_facts() {
        let text = fallback_reminder(&context());
        assert!(text.starts_with("Subject: Friendly reminder - Invoice #INV-7 due"));
        assert!(text.contains("Hi Acme Corp,"));
        assert!(text.contains("for $1100.00 is due on March 5, 2026."));
        assert!(text.ends_with("Best regards,\nPixel Forge"));
    }

    #[test]
    fn fallback_uses_defaults_for_missing_facts() {
        let text = fallback_reminder(&ReminderContext {
            client_name: Some("   ".to_string()),
            ..Default::default()
        });
        assert!(text.contains("Invoice #Unknown"));
        assert!(text.contains("Hi Valued Client,"));
        assert!(text.contains("for an amount is due on the due date."));
        assert!(text.ends_with("Our Company"));
    }

    #[test]
    fn paid_invoice_reminder_says_so() {
        let text = fallback_reminder(&ReminderContext { paid: true, ..context() });
        assert!(text.contains("for $1100.00 is marked as paid."));
        assert!(!text.contains("is due on"));
    }

    #[test]
    fn fallback_reads_back_through_the_text_parser() {
        let draft = parse_invoice_text(&fallback_reminder(&context()));
        assert_eq!(draft.client_name, "Acme Corp");
        assert!(draft.items.iter().any(|item| item.unit_price == 1100.0));
    }

    #[test]
    fn preamble_before_subject_is_dropped() {
        let tidy = tidy_model_reminder(
            "Of course! Here's a draft:\n\nSubject: Payment due\n\nHi Acme,\n\nBest regards,\nPixel Forge",
            "Pixel Forge",
        )
        .unwrap();
        assert!(tidy.starts_with("Subject: Payment due"));
    }

    #[test]
    fn missing_business_name_replaces_placeholder_signature() {
        let tidy = tidy_model_reminder(
            "```\nSubject: Payment due\n\nHi Acme,\n\nBest regards,\n[Your Company Name]\n```",
            "Pixel Forge",
        )
        .unwrap();
        assert_eq!(tidy, "Subject: Payment due\n\nHi Acme,\n\nBest regards,\nPixel Forge");
    }

    #[test]
    fn missing_business_name_is_inserted_after_closing_or_appended() {
        let tidy = tidy_model_reminder("Subject: Hi\n\nPlease pay.\nSincerely,\n\nP.S. thanks", "Pixel Forge").unwrap();
        assert_eq!(tidy, "Subject: Hi\n\nPlease pay.\nSincerely,\nPixel Forge\n\nP.S. thanks");

        let tidy = tidy_model_reminder("Subject: Hi\n\nPlease pay soon.", "Pixel Forge").unwrap();
        assert!(tidy.ends_with("Please pay soon.\nPixel Forge"));
    }

    #[test]
    fn short_model_output_is_unusable() {
        assert_eq!(tidy_model_reminder("  ok  ", "Pixel Forge"), None);
        assert_eq!(tidy_model_reminder("```json\n```", "Pixel Forge"), None);
    }

    #[test]
    fn splits_subject_from_body() {
        let (subject, body) = split_subject("Subject: Invoice #7 due\n\nHi Acme,\nPlease pay.\n");
        assert_eq!(subject, "Invoice #7 due");
        assert_eq!(body, "Hi Acme,\nPlease pay.");
    }

    #[test]
    fn missing_subject_uses_default() {
        let (subject, body) = split_subject("  Hi Acme,\nPlease pay.  ");
        assert_eq!(subject, DEFAULT_SUBJECT);
        assert_eq!(body, "Hi Acme,\nPlease pay.");

        let (subject, _) = split_subject("Subject:\nbody");
        assert_eq!(subject, DEFAULT_SUBJECT);
    }

    #[test]
    fn draft_serializes_without_absent_advisory() {
        let draft = ReminderDraft {
            reminder_text: "Subject: x".to_string(),
            ai_error: None,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value, serde_json::json!({ "reminderText": "Subject: x" }));
    }
}
