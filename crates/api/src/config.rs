//! Process configuration, read from environment variables.

use std::time::Duration;

use invoicer_ai::AiConfig;
use invoicer_ai::client::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use invoicer_infra::SmtpConfig;
use invoicer_observability::LogFormat;

pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_TTL_HOURS: i64 = 720;
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `None` when `JWT_SECRET` is unset; the dev default is used instead.
    pub jwt_secret: Option<String>,
    pub jwt_ttl: chrono::Duration,
    pub database_url: Option<String>,
    pub ai: AiConfig,
    pub smtp: Option<SmtpConfig>,
    /// Address used in the `From` header of outgoing mail.
    pub email_user: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset; unparsable numbers
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let email_user = get("EMAIL_USER");
        let smtp = match (get("SMTP_HOST"), email_user.clone(), get("EMAIL_PASS")) {
            (Some(host), Some(username), Some(password)) => Some(SmtpConfig {
                host,
                port: get("SMTP_PORT").and_then(|p| p.parse().ok()).unwrap_or(DEFAULT_SMTP_PORT),
                username,
                password,
            }),
            _ => None,
        };

        Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret: get("JWT_SECRET"),
            jwt_ttl: chrono::Duration::hours(
                get("JWT_TTL_HOURS")
                    .and_then(|h| h.parse().ok())
                    .filter(|h: &i64| *h > 0)
                    .unwrap_or(DEFAULT_JWT_TTL_HOURS),
            ),
            database_url: get("DATABASE_URL"),
            ai: AiConfig {
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: get("AI_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_TIMEOUT),
            },
            smtp,
            email_user,
            log_format: LogFormat::parse(get("LOG_FORMAT").as_deref()),
        }
    }

    pub fn jwt_secret_or_dev(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEV_JWT_SECRET)
    }
}
