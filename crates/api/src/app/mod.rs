//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, AI assistant, mailer and token signer
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and domain mapping helpers
//! - `extract.rs`: JSON body extractor with `ApiError` rejections
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.jwt.clone(),
    };

    // Protected routes: require a valid bearer token.
    let protected = Router::new()
        .route("/api/auth/me", get(routes::auth::me).put(routes::auth::update_me))
        .nest("/api/invoices", routes::invoices::router())
        .nest("/api/ai", routes::ai::router())
        .route("/api/send-reminder", post(routes::email::send_reminder))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .merge(protected)
        .fallback(routes::system::not_found)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
