//! The canonical draft record both the AI path and the fallback path produce.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Unpersisted invoice fields recovered from free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInvoiceDraft {
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<LineItemDraft>,
}

/// A draft line item. Numbers are always finite: unparsable quantities become 1,
/// unparsable prices become 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDraft {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_price")]
    pub unit_price: f64,
}

impl ParsedInvoiceDraft {
    /// Interpret a parsed model payload. Only a JSON object counts as a draft; serde
    /// would otherwise accept a positional array for a struct.
    pub fn from_model_json(value: JsonValue) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

impl LineItemDraft {
    pub fn new(name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            name: name.into(),
            quantity: quantity_or_default(Some(quantity)),
            unit_price: price_or_default(Some(unit_price)),
        }
    }
}

fn default_quantity() -> f64 {
    1.0
}

/// Zero, negative-zero and non-finite quantities collapse to 1.
pub fn quantity_or_default(raw: Option<f64>) -> f64 {
    match raw {
        Some(q) if q.is_finite() && q != 0.0 => q,
        _ => 1.0,
    }
}

pub fn price_or_default(raw: Option<f64>) -> f64 {
    match raw {
        Some(p) if p.is_finite() => p,
        _ => 0.0,
    }
}

/// Parse a numeric token such as `150`, `"150.50"`, `"$1,200"`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_from_json(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => parse_number(s),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(quantity_or_default(number_from_json(&value)))
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(price_or_default(number_from_json(&value)))
}

/// Non-array `items` become empty; non-object elements are dropped.
fn lenient_items<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<LineItemDraft>, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    let JsonValue::Array(elements) = value else {
        return Ok(Vec::new());
    };
    Ok(elements
        .into_iter()
        .filter(JsonValue::is_object)
        .filter_map(|element| serde_json::from_value(element).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_keys() {
        let draft = ParsedInvoiceDraft {
            client_name: "Acme".to_string(),
            items: vec![LineItemDraft::new("Logo", 1.0, 800.0)],
            ..Default::default()
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["clientName"], "Acme");
        assert_eq!(value["items"][0]["unitPrice"], 800.0);
    }

    #[test]
    fn coerces_loosely_typed_model_output() {
        let draft: ParsedInvoiceDraft = serde_json::from_value(json!({
            "clientName": null,
            "email": "a@b.com",
            "items": [
                { "name": "Design", "quantity": "2", "unitPrice": "$1,500.50" },
                { "name": "Logo", "quantity": "lots", "unitPrice": "tbd" },
                { "name": "Setup" },
                "not an item"
            ]
        }))
        .unwrap();

        assert_eq!(draft.client_name, "");
        assert_eq!(draft.address, "");
        assert_eq!(draft.items.len(), 3);
        assert_eq!(draft.items[0], LineItemDraft::new("Design", 2.0, 1500.5));
        assert_eq!(draft.items[1], LineItemDraft::new("Logo", 1.0, 0.0));
        assert_eq!(draft.items[2], LineItemDraft::new("Setup", 1.0, 0.0));
    }

    #[test]
    fn non_array_items_become_empty() {
        let draft: ParsedInvoiceDraft = serde_json::from_value(json!({ "items": "none" })).unwrap();
        assert!(draft.items.is_empty());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert_eq!(ParsedInvoiceDraft::from_model_json(json!(["a", "b"])), None);
        assert_eq!(ParsedInvoiceDraft::from_model_json(json!("text")), None);
        assert!(ParsedInvoiceDraft::from_model_json(json!({})).is_some());
    }

    #[test]
    fn number_parsing_never_yields_nan() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(quantity_or_default(Some(f64::NAN)), 1.0);
        assert_eq!(quantity_or_default(Some(0.0)), 1.0);
        assert_eq!(price_or_default(None), 0.0);
    }
}
