//! Catalog endpoints: browse, search, admin CRUD

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Weapon, WeaponCategory, WeaponCreate, WeaponPage, WeaponUpdate};
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::weapons::{self, WeaponFilter};
use crate::state::AppState;

use super::{ApiResult, require_admin};

/// GET /api/weapons
#[derive(Deserialize)]
pub struct WeaponsQuery {
    pub category: Option<WeaponCategory>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub required_license_level: Option<i32>,
    /// "asc" or "desc"
    pub sort_price: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<WeaponsQuery>,
) -> ApiResult<WeaponPage> {
    let price_ascending = match query.sort_price.as_deref() {
        Some("asc") => Some(true),
        Some("desc") => Some(false),
        Some(other) => {
            return Err(
                AppError::validation("sort_price must be 'asc' or 'desc'")
                    .with_detail("sort_price", other),
            );
        }
        None => None,
    };

    let filter = WeaponFilter {
        category: query.category,
        search: query.search,
        min_price: query.min_price,
        max_price: query.max_price,
        required_license_level: query.required_license_level,
        price_ascending,
    };

    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let (rows, total) = weapons::search(&state.pool, &filter, per_page, offset)
        .await
        .map_err(|e| {
            tracing::error!("Catalog search error: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    let data: Result<Vec<Weapon>, _> = rows.into_iter().map(|r| r.into_weapon()).collect();

    Ok(Json(WeaponPage {
        data: data.map_err(AppError::from)?,
        total,
        page,
        last_page: (total + per_page - 1) / per_page,
    }))
}

/// GET /api/weapons/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Weapon> {
    let row = weapons::find_by_id(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Catalog query error: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::WeaponNotFound))?;

    Ok(Json(row.into_weapon()?))
}

/// POST /api/weapons (admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<WeaponCreate>,
) -> ApiResult<Weapon> {
    require_admin(&identity)?;

    if req.name.trim().is_empty() {
        return Err(AppError::validation("Weapon name must not be empty"));
    }
    if req.price < Decimal::ZERO {
        return Err(AppError::validation("Price must not be negative"));
    }
    if req.stock < 0 {
        return Err(AppError::validation("Stock must not be negative"));
    }

    let row = weapons::insert(&state.pool, &req).await.map_err(|e| {
        tracing::error!("DB error creating weapon: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    Ok(Json(row.into_weapon()?))
}

/// PATCH /api/weapons/{id} (admin)
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<WeaponUpdate>,
) -> ApiResult<Weapon> {
    require_admin(&identity)?;

    if let Some(price) = req.price
        && price < Decimal::ZERO
    {
        return Err(AppError::validation("Price must not be negative"));
    }
    if let Some(stock) = req.stock
        && stock < 0
    {
        return Err(AppError::validation("Stock must not be negative"));
    }

    let row = weapons::update(&state.pool, id, &req)
        .await
        .map_err(|e| {
            tracing::error!("DB error updating weapon: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::WeaponNotFound))?;

    Ok(Json(row.into_weapon()?))
}

/// DELETE /api/weapons/{id} (admin)
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_admin(&identity)?;

    let deleted = weapons::delete(&state.pool, id).await.map_err(|e| {
        tracing::error!("DB error deleting weapon: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    if !deleted {
        return Err(AppError::new(ErrorCode::WeaponNotFound));
    }

    Ok(Json(ApiResponse::ok()))
}
