//! Registration and login endpoints

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Role, UserPublic};
use shared::util::now_millis;

use crate::db::users;
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

use super::ApiResult;

/// POST /api/auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub license_number: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<UserPublic> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username must not be empty"));
    }
    if req.password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let existing = users::find_by_username(&state.pool, username)
        .await
        .map_err(|e| {
            tracing::error!("DB error during registration: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;
    if existing.is_some() {
        return Err(AppError::new(ErrorCode::UsernameExists));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    // New accounts start unverified; an admin must verify them before they
    // can place orders.
    let row = users::insert(
        &state.pool,
        username,
        &password_hash,
        Role::User,
        req.license_number.as_deref(),
        now_millis(),
    )
    .await
    .map_err(|e| {
        tracing::error!("DB error creating user: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    Ok(Json(row.into_public()?))
}

/// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserPublic,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let row = users::find_by_username(&state.pool, &req.username)
        .await
        .map_err(|e| {
            tracing::error!("DB error during login: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &row.password_hash) {
        return Err(AppError::invalid_credentials());
    }

    let role = row.role()?;
    let token = crate::auth::create_token(row.id, &row.username, role, &state.jwt_secret)
        .map_err(|e| {
            tracing::error!("JWT creation failed: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    Ok(Json(LoginResponse {
        token,
        user: row.into_public()?,
    }))
}
