//! `invoicer-ai`
//!
//! **Responsibility:** the AI-assisted drafting pipeline and its deterministic fallbacks.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It must not depend on the invoice document or the stores.
//! - It never fails a caller because the model misbehaved: every operation has a
//!   deterministic fallback and reports model trouble as an advisory string.
//!
//! Flow for free-text parsing:
//! `text -> GenerativeModel -> extract_text -> strip fences / parse JSON -> draft`,
//! falling back to [`fallback::parse_invoice_text`] whenever a step fails.

pub mod assistant;
pub mod client;
pub mod draft;
pub mod error;
pub mod fallback;
pub mod insights;
pub mod normalize;
pub mod prompt;
pub mod reminder;
pub mod response;

pub use assistant::{InsightsOutcome, InvoiceAssistant, ParseOutcome};
pub use client::{AiConfig, DisabledModel, GeminiClient, GenerativeModel};
pub use draft::{LineItemDraft, ParsedInvoiceDraft};
pub use error::AiError;
pub use fallback::parse_invoice_text;
pub use insights::{InvoiceFigures, InvoiceSummary};
pub use reminder::{ReminderContext, ReminderDraft, split_subject};
pub use response::{ContentPart, ModelResponse, OutputBlock, PartText, TextSource, extract_text};
