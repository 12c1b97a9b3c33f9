//! User storage

use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use shared::models::{Role, UserPublic, UserUpdate};

use crate::error::{ServiceError, ServiceResult};

/// A `users` row. `role` stays TEXT in the DB and is converted at the edge.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub license_number: Option<String>,
    pub license_image: Option<String>,
    pub is_verified: bool,
    pub created_at: i64,
}

impl UserRow {
    pub fn role(&self) -> ServiceResult<Role> {
        Role::from_db(&self.role)
            .ok_or_else(|| ServiceError::Db(format!("unknown role in DB: {}", self.role).into()))
    }

    pub fn into_public(self) -> ServiceResult<UserPublic> {
        let role = self.role()?;
        Ok(UserPublic {
            id: self.id,
            username: self.username,
            role,
            license_number: self.license_number,
            license_image: self.license_image,
            is_verified: self.is_verified,
            created_at: self.created_at,
        })
    }
}

pub async fn find_by_username(
    executor: impl PgExecutor<'_>,
    username: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn insert(
    executor: impl PgExecutor<'_>,
    username: &str,
    password_hash: &str,
    role: Role,
    license_number: Option<&str>,
    created_at: i64,
) -> Result<UserRow, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, username, password_hash, role, license_number, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(license_number)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Partial update; absent fields keep their current value.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    update: &UserUpdate,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users SET
            license_number = COALESCE($2, license_number),
            license_image = COALESCE($3, license_image),
            is_verified = COALESCE($4, is_verified),
            role = COALESCE($5, role)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.license_number.as_deref())
    .bind(update.license_image.as_deref())
    .bind(update.is_verified)
    .bind(update.role.map(|r| r.as_str()))
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
