use thiserror::Error;

/// Failure of the generative-model round-trip or of interpreting its output.
///
/// None of these ever reach an HTTP client as a failure status; they are turned
/// into the `aiError` advisory string next to a fallback value.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI model is not configured")]
    NotConfigured,

    #[error("AI request failed: {0}")]
    Transport(String),

    #[error("AI service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("AI returned empty response")]
    EmptyResponse,

    #[error("AI returned invalid JSON")]
    InvalidJson(#[source] serde_json::Error),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AiError::Transport("request timed out".to_string())
        } else {
            AiError::Transport(err.to_string())
        }
    }
}
