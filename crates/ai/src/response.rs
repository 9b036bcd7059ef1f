//! Normalizing heterogeneous model responses into one text string.
//!
//! Providers (and SDK wrappers around them) hand back text in different shapes.
//! Instead of probing attributes at every call site, a response is classified once
//! into a closed set of [`ModelResponse`] variants and [`extract_text`] dispatches
//! on the variant.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::AiError;

/// Something that can produce text on demand (an SDK-style `text()` accessor).
pub trait TextSource: Send + Sync + fmt::Debug {
    fn text(&self) -> Result<String, AiError>;
}

/// Text carried by one content element of a structured output.
#[derive(Debug, Clone)]
pub enum PartText {
    Literal(String),
    Deferred(Arc<dyn TextSource>),
}

/// One element of an `output[].content[]` sequence.
#[derive(Debug, Clone, Default)]
pub struct ContentPart {
    pub text: Option<PartText>,
}

/// One element of an `output[]` sequence.
#[derive(Debug, Clone, Default)]
pub struct OutputBlock {
    pub content: Vec<ContentPart>,
}

/// Shape of a generative-model response.
#[derive(Debug, Clone)]
pub enum ModelResponse {
    /// The response is already plain text.
    Text(String),
    /// An object with a string `text` field.
    TextField(String),
    /// An object exposing a text-producing accessor.
    TextSource(Arc<dyn TextSource>),
    /// Nested `output[].content[]` parts; `raw` is kept for the serialization fallback.
    StructuredOutput { output: Vec<OutputBlock>, raw: JsonValue },
    /// Anything else; serialized as a last resort (`null` extracts to `""`).
    Unknown(JsonValue),
}

impl ModelResponse {
    /// Classify a JSON payload by ordered capability checks; first match wins.
    pub fn from_json(value: JsonValue) -> Self {
        if let JsonValue::String(text) = value {
            return ModelResponse::Text(text);
        }
        if let Some(text) = value.get("text").and_then(JsonValue::as_str) {
            return ModelResponse::TextField(text.to_string());
        }
        if let Some(blocks) = value.get("output").and_then(JsonValue::as_array) {
            let output = blocks.iter().map(output_block_from_json).collect();
            return ModelResponse::StructuredOutput { output, raw: value };
        }
        ModelResponse::Unknown(value)
    }
}

impl From<String> for ModelResponse {
    fn from(text: String) -> Self {
        ModelResponse::Text(text)
    }
}

impl From<&str> for ModelResponse {
    fn from(text: &str) -> Self {
        ModelResponse::Text(text.to_string())
    }
}

fn output_block_from_json(block: &JsonValue) -> OutputBlock {
    let content = block
        .get("content")
        .and_then(JsonValue::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|part| ContentPart {
                    text: part
                        .get("text")
                        .and_then(JsonValue::as_str)
                        .map(|t| PartText::Literal(t.to_string())),
                })
                .collect()
        })
        .unwrap_or_default();
    OutputBlock { content }
}

/// Produce the response's text, or `""` when nothing is extractable.
///
/// Never fails: errors raised while extracting (e.g. a deferred accessor failing)
/// are logged at debug level and yield an empty string.
pub fn extract_text(response: &ModelResponse) -> String {
    match try_extract(response) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(error = %err, "model response text extraction failed");
            String::new()
        }
    }
}

fn try_extract(response: &ModelResponse) -> Result<String, AiError> {
    match response {
        ModelResponse::Text(text) | ModelResponse::TextField(text) => Ok(text.clone()),
        ModelResponse::TextSource(source) => source.text(),
        ModelResponse::StructuredOutput { output, raw } => {
            let mut parts = Vec::new();
            for part in output.iter().flat_map(|block| &block.content) {
                match &part.text {
                    Some(PartText::Literal(text)) => parts.push(text.clone()),
                    Some(PartText::Deferred(source)) => parts.push(source.text()?),
                    None => {}
                }
            }
            if parts.is_empty() {
                serialize(raw)
            } else {
                Ok(parts.join("\n\n"))
            }
        }
        ModelResponse::Unknown(JsonValue::Null) => Ok(String::new()),
        ModelResponse::Unknown(value) => serialize(value),
    }
}

fn serialize(value: &JsonValue) -> Result<String, AiError> {
    serde_json::to_string(value).map_err(AiError::InvalidJson)
}
