use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use invoicer_ai::{GenerativeModel, InvoiceAssistant};
use invoicer_auth::Hs256Jwt;
use invoicer_infra::{
    InMemoryInvoiceStore, InMemoryUserStore, InvoiceStore, LogMailer, Mailer, PostgresInvoiceStore,
    PostgresUserStore, SmtpMailer, UserStore, bootstrap_schema,
};

use crate::config::{AppConfig, DEFAULT_JWT_TTL_HOURS};

/// Sender used in `From` when no mailbox is configured.
pub const FALLBACK_SENDER_ADDRESS: &str = "no-reply@localhost";

/// Which optional backends are live; reported by the health endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStatus {
    pub has_jwt_secret: bool,
    pub has_database: bool,
    pub has_ai: bool,
}

/// Everything handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub assistant: InvoiceAssistant,
    pub mailer: Arc<dyn Mailer>,
    pub jwt: Arc<Hs256Jwt>,
    pub sender_address: String,
    pub status: ServiceStatus,
}

impl AppServices {
    /// Wire production services from configuration.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let (users, invoices): (Arc<dyn UserStore>, Arc<dyn InvoiceStore>) = match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("failed to connect to DATABASE_URL")?;
                bootstrap_schema(&pool).await.context("failed to bootstrap schema")?;
                (
                    Arc::new(PostgresUserStore::new(pool.clone())),
                    Arc::new(PostgresInvoiceStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory stores (data is lost on restart)");
                (Arc::new(InMemoryUserStore::new()), Arc::new(InMemoryInvoiceStore::new()))
            }
        };

        if !config.ai.is_configured() {
            tracing::warn!("GEMINI_API_KEY not set; AI endpoints will use deterministic fallbacks");
        }
        let model = config.ai.build_model().context("failed to build AI client")?;

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp).context("failed to configure SMTP")?),
            None => {
                tracing::warn!("SMTP not configured; outgoing email will only be logged");
                Arc::new(LogMailer)
            }
        };

        if config.jwt_secret.is_none() {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
        }

        Ok(Self {
            users,
            invoices,
            assistant: InvoiceAssistant::new(model, config.ai.model.clone()),
            mailer,
            jwt: Arc::new(Hs256Jwt::new(config.jwt_secret_or_dev().as_bytes(), config.jwt_ttl)),
            sender_address: config
                .email_user
                .clone()
                .unwrap_or_else(|| FALLBACK_SENDER_ADDRESS.to_string()),
            status: ServiceStatus {
                has_jwt_secret: config.jwt_secret.is_some(),
                has_database: config.database_url.is_some(),
                has_ai: config.ai.is_configured(),
            },
        })
    }

    /// In-memory stores with the given model and mailer. Used by tests.
    pub fn in_memory(jwt_secret: &str, model: Arc<dyn GenerativeModel>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            invoices: Arc::new(InMemoryInvoiceStore::new()),
            assistant: InvoiceAssistant::new(model, invoicer_ai::client::DEFAULT_MODEL),
            mailer,
            jwt: Arc::new(Hs256Jwt::new(
                jwt_secret.as_bytes(),
                chrono::Duration::hours(DEFAULT_JWT_TTL_HOURS),
            )),
            sender_address: FALLBACK_SENDER_ADDRESS.to_string(),
            status: ServiceStatus {
                has_jwt_secret: true,
                has_database: false,
                has_ai: true,
            },
        }
    }
}
