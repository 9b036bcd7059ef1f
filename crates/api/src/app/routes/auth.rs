use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use invoicer_auth::{AuthError, NewUser, ProfileUpdate, User, authenticate, hash_password};
use invoicer_core::DomainError;

use crate::app::dto::{AuthResponse, LoginRequest};
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;
use crate::context::UserContext;

fn auth_response(services: &AppServices, user: &User) -> Result<AuthResponse, ApiError> {
    let token = services
        .jwt
        .issue(user.id, &user.email, Utc::now())
        .map_err(|e| ApiError::internal("Failed to issue token", e))?;
    Ok(AuthResponse {
        user: user.profile(),
        token,
    })
}

/// Run a password hash or verification on the blocking pool.
async fn off_runtime<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal("Authentication failed", e))?
        .map_err(ApiError::from)
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(input): JsonBody<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    if services.users.find_by_email(&input.email).await?.is_some() {
        return Err(DomainError::conflict("User already exists").into());
    }

    let password = input.password.clone();
    let password_hash = off_runtime(move || hash_password(&password)).await?;
    let user = User::register(input, password_hash, Utc::now())?;
    let user = services.users.insert(user).await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(auth_response(&services, &user)?)))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(input): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let user = services.users.find_by_email(&input.email).await?;
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let password = input.password;
    off_runtime(move || authenticate(&password, stored.as_deref())).await?;

    // A missing account has already failed in authenticate().
    let user = user.ok_or(AuthError::InvalidCredentials)?;
    Ok(Json(auth_response(&services, &user)?))
}

async fn current_user(services: &AppServices, ctx: &UserContext) -> Result<User, ApiError> {
    services
        .users
        .find_by_id(ctx.user_id())
        .await?
        .ok_or_else(|| DomainError::not_found("User").into())
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&services, &ctx).await?;
    Ok(Json(user.profile()))
}

pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = current_user(&services, &ctx).await?;
    user.apply_profile(update, Utc::now());
    let user = services.users.update(user).await?;
    tracing::info!(user_id = %user.id, email = %ctx.email(), "profile updated");
    Ok(Json(user.profile()))
}
