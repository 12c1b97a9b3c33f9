//! Order endpoints: placement, buyer history, admin review

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{OrderDetail, OrderReceipt, OrderStatus, Role};
use uuid::Uuid;

use crate::auth::Identity;
use crate::db::orders;
use crate::services::orders::{PlaceOrderRequest, place_order};
use crate::state::AppState;

use super::{ApiResult, require_admin};

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PlaceOrderRequest>,
) -> ApiResult<OrderReceipt> {
    let receipt = place_order(&state.pool, &identity, req).await?;
    Ok(Json(receipt))
}

/// GET /api/orders/my-orders
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<OrderDetail>> {
    let orders = orders::list_for_user(&state.pool, identity.user_id).await?;
    Ok(Json(orders))
}

/// GET /api/orders (admin)
pub async fn list_all(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<OrderDetail>> {
    require_admin(&identity)?;
    let orders = orders::list_all(&state.pool).await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id} — the buyer themselves or an admin
pub async fn get_one(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetail> {
    let order = orders::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if identity.role != Role::Admin && order.user_id != identity.user_id {
        // Hide the order's existence from other users.
        return Err(AppError::new(ErrorCode::OrderNotFound));
    }

    Ok(Json(order))
}

/// PATCH /api/orders/{id}/status (admin)
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<ApiResponse<()>> {
    require_admin(&identity)?;

    let status = OrderStatus::from_db(&req.status).ok_or_else(|| {
        AppError::validation("status must be 'pending', 'approved' or 'rejected'")
            .with_detail("status", req.status.clone())
    })?;

    let updated = orders::set_status(&state.pool, id, status)
        .await
        .map_err(|e| {
            tracing::error!("DB error updating order status: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    if !updated {
        return Err(AppError::new(ErrorCode::OrderNotFound));
    }

    tracing::info!(order_id = %id, status = status.as_str(), "order status updated");
    Ok(Json(ApiResponse::ok()))
}
