//! Catalog storage and the stock ledger
//!
//! `reserve_and_decrement` is the only place stock is ever reduced. It locks
//! the row with `SELECT ... FOR UPDATE` so concurrent orders serialize on the
//! same weapon and the `stock >= 0` check can never be raced past.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};
use shared::models::{Weapon, WeaponCategory, WeaponCreate, WeaponUpdate};
use shared::util::now_millis;

use crate::error::{ServiceError, ServiceResult};

/// A `weapons` row. `category` stays TEXT in the DB and is converted at the edge.
#[derive(Debug, Clone, FromRow)]
pub struct WeaponRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub required_license_level: i32,
    pub image: Option<String>,
    pub updated_at: i64,
}

impl WeaponRow {
    pub fn into_weapon(self) -> ServiceResult<Weapon> {
        let category = WeaponCategory::from_db(&self.category).ok_or_else(|| {
            ServiceError::Db(format!("unknown weapon category in DB: {}", self.category).into())
        })?;
        Ok(Weapon {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category,
            required_license_level: self.required_license_level,
            image: self.image,
            updated_at: self.updated_at,
        })
    }
}

/// Catalog search filters, all optional.
#[derive(Debug, Default)]
pub struct WeaponFilter {
    pub category: Option<WeaponCategory>,
    /// Case-insensitive substring over name and description
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub required_license_level: Option<i32>,
    /// Sort by price: ascending when true, descending when false
    pub price_ascending: Option<bool>,
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &WeaponFilter) {
    builder.push(" WHERE TRUE");
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(level) = filter.required_license_level {
        builder
            .push(" AND required_license_level = ")
            .push_bind(level);
    }
}

/// Paged catalog search. Returns the matching page and the total match count.
pub async fn search(
    pool: &PgPool,
    filter: &WeaponFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<WeaponRow>, i64), sqlx::Error> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM weapons");
    push_filters(&mut count_builder, filter);
    let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM weapons");
    push_filters(&mut builder, filter);
    match filter.price_ascending {
        Some(true) => builder.push(" ORDER BY price ASC"),
        Some(false) => builder.push(" ORDER BY price DESC"),
        None => builder.push(" ORDER BY name ASC"),
    };
    builder.push(" LIMIT ").push_bind(limit);
    builder.push(" OFFSET ").push_bind(offset);

    let rows = builder.build_query_as::<WeaponRow>().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<WeaponRow>, sqlx::Error> {
    sqlx::query_as::<_, WeaponRow>("SELECT * FROM weapons WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn insert(pool: &PgPool, create: &WeaponCreate) -> Result<WeaponRow, sqlx::Error> {
    sqlx::query_as::<_, WeaponRow>(
        r#"
        INSERT INTO weapons (
            id, name, description, price, stock, category,
            required_license_level, image, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&create.name)
    .bind(&create.description)
    .bind(create.price)
    .bind(create.stock)
    .bind(create.category.as_str())
    .bind(create.required_license_level)
    .bind(create.image.as_deref())
    .bind(now_millis())
    .fetch_one(pool)
    .await
}

/// Partial update; absent fields keep their current value.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    update: &WeaponUpdate,
) -> Result<Option<WeaponRow>, sqlx::Error> {
    sqlx::query_as::<_, WeaponRow>(
        r#"
        UPDATE weapons SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            stock = COALESCE($5, stock),
            category = COALESCE($6, category),
            required_license_level = COALESCE($7, required_license_level),
            image = COALESCE($8, image),
            updated_at = $9
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.name.as_deref())
    .bind(update.description.as_deref())
    .bind(update.price)
    .bind(update.stock)
    .bind(update.category.map(|c| c.as_str()))
    .bind(update.required_license_level)
    .bind(update.image.as_deref())
    .bind(now_millis())
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM weapons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// One cart line after its stock has been reserved inside a transaction.
///
/// `unit_price` is the catalog price at the moment the row was locked; it is
/// what gets frozen into the order line.
#[derive(Debug, Clone)]
pub struct ReservedLine {
    pub weapon_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub required_license_level: i32,
    pub quantity: i32,
}

/// Lock a weapon row, check stock, and decrement it — all inside the caller's
/// transaction. Rolling the transaction back undoes the decrement.
pub async fn reserve_and_decrement(
    tx: &mut PgConnection,
    weapon_id: Uuid,
    quantity: i32,
) -> ServiceResult<ReservedLine> {
    let row = sqlx::query_as::<_, WeaponRow>("SELECT * FROM weapons WHERE id = $1 FOR UPDATE")
        .bind(weapon_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::WeaponNotFound).with_detail("weapon_id", weapon_id.to_string())
        })?;

    if quantity > row.stock {
        return Err(AppError::new(ErrorCode::InsufficientStock)
            .with_detail("weapon", row.name.clone())
            .with_detail("requested", quantity)
            .with_detail("available", row.stock)
            .into());
    }

    sqlx::query("UPDATE weapons SET stock = stock - $2, updated_at = $3 WHERE id = $1")
        .bind(weapon_id)
        .bind(quantity)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

    Ok(ReservedLine {
        weapon_id: row.id,
        name: row.name,
        unit_price: row.price,
        required_license_level: row.required_license_level,
        quantity,
    })
}
