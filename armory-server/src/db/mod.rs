//! Data access layer — sqlx/Postgres queries
//!
//! Single-statement helpers take `impl PgExecutor<'_>` so they run against
//! the pool or inside a transaction; multi-statement operations take the
//! transaction connection explicitly.

pub mod orders;
pub mod users;
pub mod weapons;
