//! Prompt builders. Each prompt pins the output shape the caller parses.

use crate::insights::InvoiceSummary;
use crate::reminder::ReminderContext;

pub fn parse_invoice_prompt(text: &str) -> String {
    format!(
        r#"You are an expert invoice data extraction AI. Analyze the following text and extract the relevant information to create an invoice.
The output MUST be a valid JSON object with this structure:
{{
  "clientName": "string",
  "email": "string (if available)",
  "address": "string (if available)",
  "items": [
    {{ "name": "string", "quantity": number, "unitPrice": number }}
  ]
}}

Here is the text to parse:
--- TEXT START ---
{text}
--- TEXT END ---

Extract the data and provide only the JSON object."#
    )
}

pub fn reminder_prompt(ctx: &ReminderContext) -> String {
    format!(
        r#"You are a professional and polite accounting assistant. Write a friendly reminder email to a client about an overdue or upcoming invoice payment.

Use the following details to personalize the email:
- Client Name: {client}
- Invoice Number: {number}
- Amount Due: {amount}
- Due Date: {due}
- Status: {status}
- Business Name: {business}

The email must:
- Start with "Subject:" as the first line.
- Begin the body with "Hi {client}," without any intro or explanation.
- Maintain a friendly, clear, concise tone.
- End with a proper closing that includes the Business Name in the signature."#,
        client = ctx.client_name(),
        number = ctx.invoice_number(),
        amount = ctx.amount(),
        due = ctx.due_date(),
        status = if ctx.paid { "Paid" } else { "Unpaid" },
        business = ctx.business_name(),
    )
}

pub fn insights_prompt(summary: &InvoiceSummary) -> String {
    format!(
        r#"You are a friendly and insightful financial analyst for a small business owner.
Based on the following summary of their invoice data, provide 2-3 concise and actionable insights.
The insights should be encouraging and helpful. Do not just repeat the data.
For example, if there is a high outstanding amount, suggest sending reminders.

Data Summary:
{data}

Return a valid JSON object with a single key "insights" holding an array of strings.
Example: {{ "insights": ["Your revenue is looking strong this month!", "You have 5 unpaid invoices. Consider sending reminders."] }}"#,
        data = summary.describe(),
    )
}
