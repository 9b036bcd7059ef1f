//! Generative-model clients: the trait seam, the Gemini REST client, and a stand-in
//! used when no API key is configured.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::AiError;
use crate::response::{ModelResponse, TextSource};

pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One prompt in, one response out. No retries; callers degrade on error.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ModelResponse, AiError>;
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AiConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Gemini when a key is present, otherwise [`DisabledModel`].
    pub fn build_model(&self) -> Result<Arc<dyn GenerativeModel>, AiError> {
        match self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Ok(Arc::new(GeminiClient::new(key, &self.base_url, self.timeout)?)),
            None => Ok(Arc::new(DisabledModel)),
        }
    }
}

/// `generateContent` over the Gemini REST API.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ModelResponse, AiError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let res = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply: GeminiReply = serde_json::from_str(&text).map_err(AiError::InvalidJson)?;
        Ok(ModelResponse::TextSource(Arc::new(reply)))
    }
}

/// Raw `generateContent` reply. Text is assembled lazily from the first candidate.
#[derive(Debug, Default, Deserialize)]
pub struct GeminiReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl TextSource for GeminiReply {
    fn text(&self) -> Result<String, AiError> {
        let candidate = self.candidates.first().ok_or(AiError::EmptyResponse)?;
        let text = candidate
            .content
            .iter()
            .flat_map(|c| &c.parts)
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();
        Ok(text)
    }
}

/// Used when no API key is configured; every call fails fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledModel;

#[async_trait::async_trait]
impl GenerativeModel for DisabledModel {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<ModelResponse, AiError> {
        Err(AiError::NotConfigured)
    }
}
