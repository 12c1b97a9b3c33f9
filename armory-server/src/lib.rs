//! Armory storefront server
//!
//! HTTP backend for a regulated-goods storefront:
//!
//! - **Catalog** (`api::weapons`, `db::weapons`): browse/search, admin CRUD,
//!   and the stock ledger (`reserve_and_decrement`)
//! - **Orders** (`services::orders`, `db::orders`): the transactional order
//!   placement path, buyer history, admin review
//! - **Accounts** (`api::auth`, `api::users`, `db::users`): registration,
//!   login, admin verification of buyer licenses
//! - **Auth** (`auth`): JWT middleware + Argon2 password hashing

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod util;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
