//! Authentication: JWT claims, token creation, axum middleware

pub mod jwt;

pub use jwt::{Identity, auth_middleware, create_token};
