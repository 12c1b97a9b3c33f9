//! API routes for armory-server

pub mod auth;
pub mod health;
pub mod orders;
pub mod users;
pub mod weapons;

use axum::routing::{get, patch, post};
use axum::{Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;
use tower_http::trace::TraceLayer;

use crate::auth::{Identity, auth_middleware};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Reject non-admin callers. Admin-gated handlers call this first.
pub fn require_admin(identity: &Identity) -> Result<(), AppError> {
    if identity.role != Role::Admin {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(())
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Registration and login (no auth)
    let public = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    // Everything else requires a valid token; admin-only handlers enforce
    // the role themselves via require_admin.
    let authenticated = Router::new()
        .route("/api/weapons", get(weapons::list).post(weapons::create))
        .route(
            "/api/weapons/{id}",
            get(weapons::get_one)
                .patch(weapons::update)
                .delete(weapons::remove),
        )
        .route("/api/orders", post(orders::create).get(orders::list_all))
        .route("/api/orders/my-orders", get(orders::my_orders))
        .route("/api/orders/{id}", get(orders::get_one))
        .route("/api/orders/{id}/status", patch(orders::update_status))
        .route("/api/users", get(users::list))
        .route(
            "/api/users/{id}",
            get(users::get_one)
                .patch(users::update)
                .delete(users::remove),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public)
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
