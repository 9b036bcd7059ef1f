use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use invoicer_core::{DomainError, DomainResult, InvoiceId, UserId};

use crate::dates;

pub const DEFAULT_PAYMENT_TERMS: &str = "Net 15";

/// Invoice payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Unpaid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Unpaid => "Unpaid",
        }
    }
}

/// Issuer block printed on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillFrom {
    pub business_name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// Recipient block printed on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillTo {
    pub client_name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// A line item as submitted by a client (totals are derived, never trusted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_percent: f64,
}

/// A persisted line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_percent: f64,
    /// `quantity * unit_price`, before tax.
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_total: f64,
    pub total: f64,
}

/// Sum line amounts and per-line tax.
pub fn compute_totals(items: &[ItemInput]) -> Totals {
    let (subtotal, tax_total) = items.iter().fold((0.0, 0.0), |(sub, tax), item| {
        let amount = item.unit_price * item.quantity;
        (sub + amount, tax + amount * item.tax_percent / 100.0)
    });
    Totals {
        subtotal,
        tax_total,
        total: subtotal + tax_total,
    }
}

fn validate_items(items: &[ItemInput]) -> DomainResult<()> {
    for (idx, item) in items.iter().enumerate() {
        let line = idx + 1;
        if item.name.trim().is_empty() {
            return Err(DomainError::validation(format!("item {line}: name is required")));
        }
        let numbers = [item.quantity, item.unit_price, item.tax_percent];
        if numbers.iter().any(|n| !n.is_finite() || *n < 0.0) {
            return Err(DomainError::validation(format!(
                "item {line}: quantity, unitPrice and taxPercent must be non-negative numbers"
            )));
        }
    }
    Ok(())
}

fn materialize(items: Vec<ItemInput>) -> Vec<InvoiceItem> {
    items
        .into_iter()
        .map(|i| InvoiceItem {
            total: i.quantity * i.unit_price,
            name: i.name.trim().to_string(),
            quantity: i.quantity,
            unit_price: i.unit_price,
            tax_percent: i.tax_percent,
        })
        .collect()
}

/// Creation input (`POST /api/invoices`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default, deserialize_with = "dates::deserialize_optional")]
    pub invoice_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_optional")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bill_from: BillFrom,
    #[serde(default)]
    pub bill_to: BillTo,
    #[serde(default)]
    pub items: Vec<ItemInput>,
    pub notes: Option<String>,
    pub payment_terms: Option<String>,
    pub status: Option<InvoiceStatus>,
}

/// Partial update (`PUT /api/invoices/:id`); `None` leaves a field untouched.
///
/// `due_date` and `notes` are clearable: an explicit `null` arrives as
/// `Some(None)`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "dates::deserialize_optional")]
    pub invoice_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_clearable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub bill_from: Option<BillFrom>,
    pub bill_to: Option<BillTo>,
    pub items: Option<Vec<ItemInput>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    pub payment_terms: Option<String>,
    pub status: Option<InvoiceStatus>,
}

/// Only called for keys present in the payload, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Invoice document, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub owner: UserId,
    pub invoice_number: String,
    pub invoice_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub bill_from: BillFrom,
    pub bill_to: BillTo,
    pub items: Vec<InvoiceItem>,
    pub notes: Option<String>,
    pub payment_terms: String,
    pub status: InvoiceStatus,
    pub subtotal: f64,
    pub tax_total: f64,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Validate input and build a new invoice with derived totals.
    pub fn create(owner: UserId, input: NewInvoice, now: DateTime<Utc>) -> DomainResult<Self> {
        let invoice_number = input.invoice_number.trim();
        if invoice_number.is_empty() {
            return Err(DomainError::validation("invoiceNumber is required"));
        }
        validate_items(&input.items)?;

        let totals = compute_totals(&input.items);
        Ok(Self {
            id: InvoiceId::new(),
            owner,
            invoice_number: invoice_number.to_string(),
            invoice_date: input.invoice_date.unwrap_or(now),
            due_date: input.due_date,
            bill_from: input.bill_from,
            bill_to: input.bill_to,
            items: materialize(input.items),
            notes: input.notes,
            payment_terms: input
                .payment_terms
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_TERMS.to_string()),
            status: input.status.unwrap_or_default(),
            subtotal: totals.subtotal,
            tax_total: totals.tax_total,
            total: totals.total,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Totals are recomputed only when items are supplied.
    pub fn apply_update(&mut self, update: InvoiceUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(number) = &update.invoice_number {
            if number.trim().is_empty() {
                return Err(DomainError::validation("invoiceNumber cannot be blank"));
            }
        }
        if let Some(items) = &update.items {
            validate_items(items)?;
        }

        if let Some(number) = update.invoice_number {
            self.invoice_number = number.trim().to_string();
        }
        if let Some(date) = update.invoice_date {
            self.invoice_date = date;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(bill_from) = update.bill_from {
            self.bill_from = bill_from;
        }
        if let Some(bill_to) = update.bill_to {
            self.bill_to = bill_to;
        }
        if let Some(items) = update.items {
            let totals = compute_totals(&items);
            self.items = materialize(items);
            self.subtotal = totals.subtotal;
            self.tax_total = totals.tax_total;
            self.total = totals.total;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(terms) = update.payment_terms {
            self.payment_terms = terms;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Another user's invoice reads as missing, so ids never leak across accounts.
    pub fn ensure_owned_by(&self, user: UserId) -> DomainResult<()> {
        if self.is_owned_by(user) {
            Ok(())
        } else {
            Err(DomainError::not_found("Invoice"))
        }
    }
}
