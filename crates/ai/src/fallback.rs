//! Deterministic invoice extraction from free text.
//!
//! Used whenever the model is unavailable or its output cannot be used. Header
//! fields are searched across the whole text; line items are matched line by line
//! against an ordered cascade of rules where the first matching rule wins. Scanning
//! per line keeps the permissive name patterns from backtracking across the whole
//! document.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::draft::{LineItemDraft, ParsedInvoiceDraft, parse_number, price_or_default, quantity_or_default};

/// Lines at least this long are never taken as a client name by the fallback rule.
const CLIENT_LINE_MAX_CHARS: usize = 60;

lazy_static! {
    static ref CLIENT_LABEL: Regex = Regex::new(
        r"(?i)(?:(?:Invoice for|Bill To)\s*[:\-]?|Client\s*[:\-])\s*([A-Z0-9][A-Za-z0-9 .,&'\-]{2,100})"
    )
    .unwrap();
    static ref EMAIL: Regex = Regex::new(r"(?i)[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,}").unwrap();
    static ref ADDRESS_LABEL: Regex = Regex::new(r"(?is)Address[:\-]\s*(.{5,200})").unwrap();

    /// `2 hours of design at $150/hr`, `3 x Widget @ 20`, `2 x 4K monitor at $300`.
    ///
    /// The quantity must be a complete number, not preceded by a digit, `.` or `$`
    /// and followed by whitespace or an `x`/`×` separator. A price like `$25.50`
    /// therefore never reads as a quantity.
    static ref QUANTITY_FIRST: Regex = Regex::new(
        r"(?i)(?:^|[^0-9.$])([0-9]+(?:\.[0-9]+)?)(?:\s*(?:x|×)\s*|\s+)(?:(?:hours|hrs|units|pcs|pieces)\s+)?(?:of\s+)?([A-Za-z0-9 \-_.&()]{3,80}?)\s*(?:at|@|for)?\s*\$?([0-9]+(?:\.[0-9]+)?)(?:/hour|/hr| per hour)?"
    )
    .unwrap();
    /// `Logo design - $800`, `Hosting: 25`, `4K monitor: 300`.
    static ref NAME_PRICE: Regex = Regex::new(
        r"(?i)([A-Za-z0-9 \-_.&()]{3,80}?)\s*[-:]\s*\$?([0-9]+(?:\.[0-9]+)?)"
    )
    .unwrap();
    static ref PRICE_TOKEN: Regex = Regex::new(r"\$?([0-9]+(?:\.[0-9]+)?)").unwrap();
    static ref HAS_LETTER: Regex = Regex::new(r"[A-Za-z]").unwrap();
}

/// One step of the line-item cascade.
struct LineRule {
    name: &'static str,
    apply: fn(&str) -> Option<LineItemDraft>,
}

/// Evaluated in order; a line contributes at most one item.
const LINE_RULES: [LineRule; 3] = [
    LineRule {
        name: "quantity_first",
        apply: quantity_first,
    },
    LineRule {
        name: "name_price",
        apply: name_price,
    },
    LineRule {
        name: "bare_price",
        apply: bare_price,
    },
];

/// Extract as much of an invoice as possible from `text`. Never fails; fields that
/// cannot be found stay empty.
pub fn parse_invoice_text(text: &str) -> ParsedInvoiceDraft {
    let mut draft = ParsedInvoiceDraft {
        client_name: capture(&CLIENT_LABEL, text),
        email: EMAIL.find(text).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
        address: address(text),
        items: Vec::new(),
    };

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((rule, item)) = LINE_RULES.iter().find_map(|r| (r.apply)(line).map(|i| (r.name, i))) {
            tracing::trace!(rule, line, "matched line item");
            draft.items.push(item);
        }
    }

    if draft.client_name.is_empty() {
        if let Some(first) = text.lines().find(|l| !l.trim().is_empty()) {
            if first.chars().count() < CLIENT_LINE_MAX_CHARS {
                draft.client_name = first.trim().to_string();
            }
        }
    }

    draft
}

fn capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn address(text: &str) -> String {
    let block = capture(&ADDRESS_LABEL, text);
    block.lines().next().unwrap_or_default().trim().to_string()
}

fn number_at(caps: &Captures<'_>, idx: usize) -> Option<f64> {
    caps.get(idx).and_then(|m| parse_number(m.as_str()))
}

/// Trim whitespace and stray separators left at the ends of a lazily matched name.
fn clean_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | '—'))
        .to_string()
}

fn quantity_first(line: &str) -> Option<LineItemDraft> {
    let caps = QUANTITY_FIRST.captures(line)?;
    let name = clean_name(caps.get(2).map_or("", |m| m.as_str()));
    Some(LineItemDraft {
        name: if name.is_empty() { "Item".to_string() } else { name },
        quantity: quantity_or_default(number_at(&caps, 1)),
        unit_price: price_or_default(number_at(&caps, 3)),
    })
}

fn name_price(line: &str) -> Option<LineItemDraft> {
    let caps = NAME_PRICE.captures(line)?;
    let name = clean_name(caps.get(1).map_or("", |m| m.as_str()));
    if name.is_empty() {
        return None;
    }
    Some(LineItemDraft {
        name,
        quantity: 1.0,
        unit_price: price_or_default(number_at(&caps, 2)),
    })
}

/// `$800 — Logo`: any line with a letter and a number. The first price token is cut
/// out and dash/colon characters are dropped from what remains.
fn bare_price(line: &str) -> Option<LineItemDraft> {
    if !HAS_LETTER.is_match(line) {
        return None;
    }
    let caps = PRICE_TOKEN.captures(line)?;
    let token = caps.get(0)?;
    let rest = format!("{}{}", &line[..token.start()], &line[token.end()..]);
    let name: String = rest.chars().filter(|c| !matches!(c, '-' | '—' | ':')).collect();
    let name = name.trim();
    Some(LineItemDraft {
        name: if name.is_empty() { "Item".to_string() } else { name.to_string() },
        quantity: 1.0,
        unit_price: price_or_default(number_at(&caps, 1)),
    })
}
