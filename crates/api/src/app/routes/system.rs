use std::sync::Arc;

use axum::{
    extract::{Extension, OriginalUri},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::app::services::AppServices;

/// Liveness plus which optional backends are configured.
pub async fn root(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let status = services.status;
    Json(serde_json::json!({
        "message": "API is running...",
        "timestamp": Utc::now().to_rfc3339(),
        "env": {
            "hasJWT": status.has_jwt_secret,
            "hasDatabase": status.has_database,
            "hasAi": status.has_ai,
        }
    }))
}

pub async fn health(services: Extension<Arc<AppServices>>) -> impl IntoResponse {
    root(services).await
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Route not found",
            "path": uri.path(),
        })),
    )
}
