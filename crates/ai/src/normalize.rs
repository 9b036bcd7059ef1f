//! Fence stripping and the single strict JSON parse attempt.

use serde::de::DeserializeOwned;

use crate::error::AiError;

/// Remove every Markdown code-fence marker (```` ```json ```` and ```` ``` ````) and
/// surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Strip fences, then make exactly one strict parse attempt. No repair, no retry.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(AiError::InvalidJson)
}
