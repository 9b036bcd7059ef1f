use std::sync::Arc;

use anyhow::Context;

use invoicer_api::app::{build_app, services::AppServices};
use invoicer_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    invoicer_observability::init(config.log_format);

    let services = AppServices::from_config(&config).await?;
    tracing::info!(
        has_jwt = services.status.has_jwt_secret,
        has_database = services.status.has_database,
        has_ai = services.status.has_ai,
        model = %services.assistant.model_name(),
        "services ready"
    );
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
