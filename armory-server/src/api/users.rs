//! User administration endpoints (admin only)

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{UserPublic, UserUpdate};
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::users;
use crate::state::AppState;

use super::{ApiResult, require_admin};

/// GET /api/users (admin)
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<UserPublic>> {
    require_admin(&identity)?;

    let rows = users::list(&state.pool).await.map_err(|e| {
        tracing::error!("DB error listing users: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    let result: Result<Vec<UserPublic>, _> =
        rows.into_iter().map(|r| r.into_public()).collect();
    Ok(Json(result.map_err(AppError::from)?))
}

/// GET /api/users/{id} (admin)
pub async fn get_one(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserPublic> {
    require_admin(&identity)?;

    let row = users::find_by_id(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("DB error fetching user: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    Ok(Json(row.into_public()?))
}

/// PATCH /api/users/{id} (admin) — includes flipping `is_verified`
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserUpdate>,
) -> ApiResult<UserPublic> {
    require_admin(&identity)?;

    let row = users::update(&state.pool, id, &req)
        .await
        .map_err(|e| {
            tracing::error!("DB error updating user: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    Ok(Json(row.into_public()?))
}

/// DELETE /api/users/{id} (admin)
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_admin(&identity)?;

    if identity.user_id == id {
        return Err(AppError::validation("Cannot delete your own account"));
    }

    let deleted = users::delete(&state.pool, id).await.map_err(|e| {
        tracing::error!("DB error deleting user: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    if !deleted {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }

    Ok(Json(ApiResponse::ok()))
}
