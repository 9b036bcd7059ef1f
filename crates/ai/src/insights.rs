//! Dashboard summary figures and the insight payload.

use serde::Deserialize;

pub const NO_DATA_INSIGHT: &str = "No invoice data available to generate insights.";

/// How many of the newest invoices are listed in the summary.
pub const RECENT_LIMIT: usize = 5;

/// The slice of an invoice the dashboard needs.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFigures {
    pub invoice_number: String,
    pub total: f64,
    pub paid: bool,
}

/// Aggregates over one user's invoices.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSummary {
    pub total_count: usize,
    pub paid_count: usize,
    pub unpaid_count: usize,
    pub revenue: f64,
    pub outstanding: f64,
    pub recent: Vec<InvoiceFigures>,
}

impl InvoiceSummary {
    /// `invoices` is expected newest first.
    pub fn from_invoices(invoices: &[InvoiceFigures]) -> Self {
        let (paid, unpaid): (Vec<_>, Vec<_>) = invoices.iter().partition(|inv| inv.paid);
        Self {
            total_count: invoices.len(),
            paid_count: paid.len(),
            unpaid_count: unpaid.len(),
            revenue: paid.iter().map(|inv| inv.total).sum(),
            outstanding: unpaid.iter().map(|inv| inv.total).sum(),
            recent: invoices.iter().take(RECENT_LIMIT).cloned().collect(),
        }
    }

    /// Bullet list fed to the insight prompt.
    pub fn describe(&self) -> String {
        let recent = self
            .recent
            .iter()
            .map(|inv| {
                format!(
                    "Invoice #{} for {:.2} with status {}",
                    inv.invoice_number,
                    inv.total,
                    if inv.paid { "Paid" } else { "Unpaid" }
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "- Total number of invoices: {}\n\
             - Total paid invoices: {}\n\
             - Total unpaid/pending invoices: {}\n\
             - Total revenue from paid invoices: {:.2}\n\
             - Total outstanding amount from unpaid/pending invoices: {:.2}\n\
             - Recent invoices (last {}): {}",
            self.total_count,
            self.paid_count,
            self.unpaid_count,
            self.revenue,
            self.outstanding,
            RECENT_LIMIT,
            recent,
        )
    }

    /// Insights computed without the model.
    pub fn canned_insights(&self) -> Vec<String> {
        let mut insights = vec![format!(
            "You have issued {} invoice{}; {} paid and {} still open.",
            self.total_count,
            if self.total_count == 1 { "" } else { "s" },
            self.paid_count,
            self.unpaid_count,
        )];

        if self.revenue > 0.0 {
            insights.push(format!("Paid invoices have brought in ${:.2} so far.", self.revenue));
        }

        if self.unpaid_count > 0 {
            insights.push(format!(
                "${:.2} is outstanding across {} unpaid invoice{}. Consider sending reminders to get paid faster.",
                self.outstanding,
                self.unpaid_count,
                if self.unpaid_count == 1 { "" } else { "s" },
            ));
        } else {
            insights.push("Every invoice is paid. Nice work keeping on top of collections!".to_string());
        }

        insights
    }
}

/// What the model may return: `{"insights": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum InsightsPayload {
    Wrapped { insights: Vec<String> },
    Bare(Vec<String>),
}

impl InsightsPayload {
    /// Blank entries are dropped; `None` if nothing is left.
    pub(crate) fn into_insights(self) -> Option<Vec<String>> {
        let raw = match self {
            InsightsPayload::Wrapped { insights } | InsightsPayload::Bare(insights) => insights,
        };
        let insights: Vec<String> = raw
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        (!insights.is_empty()).then_some(insights)
    }
}
