//! Order storage — aggregate insert, queries, status update

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{OrderDetail, OrderItemDetail, OrderStatus, WeaponCategory, WeaponSummary};

use crate::error::{ServiceError, ServiceResult};

/// An order header ready for insertion.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub received_date: Option<NaiveDate>,
    pub created_at: i64,
}

/// One order line ready for insertion.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub id: Uuid,
    pub weapon_id: Uuid,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

/// Insert the order and all of its lines inside the caller's transaction.
pub async fn insert_order_with_items(
    tx: &mut PgConnection,
    order: &NewOrder,
    items: &[NewOrderItem],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, status, total_price, received_date, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.status.as_str())
    .bind(order.total_price)
    .bind(order.received_date)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await?;

    let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let weapon_ids: Vec<Uuid> = items.iter().map(|i| i.weapon_id).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let prices: Vec<Decimal> = items.iter().map(|i| i.price_at_purchase).collect();

    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, weapon_id, quantity, price_at_purchase)
        SELECT t.id, $2, t.weapon_id, t.quantity, t.price
        FROM UNNEST($1::uuid[], $3::uuid[], $4::int[], $5::numeric[])
            AS t(id, weapon_id, quantity, price)
        "#,
    )
    .bind(&ids)
    .bind(order.id)
    .bind(&weapon_ids)
    .bind(&quantities)
    .bind(&prices)
    .execute(&mut *tx)
    .await?;

    Ok(())
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    username: Option<String>,
    status: String,
    total_price: Decimal,
    received_date: Option<NaiveDate>,
    created_at: i64,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    order_id: Uuid,
    weapon_id: Option<Uuid>,
    quantity: i32,
    price_at_purchase: Decimal,
    weapon_name: Option<String>,
    weapon_category: Option<String>,
    weapon_image: Option<String>,
}

impl ItemRow {
    fn into_detail(self) -> ServiceResult<OrderItemDetail> {
        // The weapon may have been deleted from the catalog since purchase;
        // the frozen line still stands on its own.
        let weapon = match (self.weapon_id, self.weapon_name, self.weapon_category) {
            (Some(id), Some(name), Some(category)) => {
                let category = WeaponCategory::from_db(&category).ok_or_else(|| {
                    ServiceError::Db(format!("unknown weapon category in DB: {category}").into())
                })?;
                Some(WeaponSummary {
                    id,
                    name,
                    category,
                    image: self.weapon_image,
                })
            }
            _ => None,
        };
        Ok(OrderItemDetail {
            id: self.id,
            weapon,
            quantity: self.quantity,
            price_at_purchase: self.price_at_purchase,
        })
    }
}

fn into_detail(row: OrderRow, items: Vec<OrderItemDetail>) -> ServiceResult<OrderDetail> {
    let status = OrderStatus::from_db(&row.status).ok_or_else(|| {
        ServiceError::Db(format!("unknown order status in DB: {}", row.status).into())
    })?;
    Ok(OrderDetail {
        id: row.id,
        user_id: row.user_id,
        username: row.username,
        status,
        total_price: row.total_price,
        received_date: row.received_date,
        created_at: row.created_at,
        items,
    })
}

/// Fetch lines (with current catalog details) for a set of orders, grouped by order.
async fn fetch_items(
    pool: &PgPool,
    order_ids: &[Uuid],
) -> ServiceResult<HashMap<Uuid, Vec<OrderItemDetail>>> {
    let rows = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT oi.id, oi.order_id, oi.weapon_id, oi.quantity, oi.price_at_purchase,
               w.name AS weapon_name, w.category AS weapon_category, w.image AS weapon_image
        FROM order_items oi
        LEFT JOIN weapons w ON w.id = oi.weapon_id
        WHERE oi.order_id = ANY($1)
        "#,
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    for row in rows {
        let order_id = row.order_id;
        by_order.entry(order_id).or_default().push(row.into_detail()?);
    }
    Ok(by_order)
}

fn assemble(
    rows: Vec<OrderRow>,
    mut items: HashMap<Uuid, Vec<OrderItemDetail>>,
) -> ServiceResult<Vec<OrderDetail>> {
    rows.into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            into_detail(row, order_items)
        })
        .collect()
}

/// A user's own orders, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> ServiceResult<Vec<OrderDetail>> {
    let rows = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT id, user_id, NULL::text AS username, status, total_price,
               received_date, created_at
        FROM orders WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = fetch_items(pool, &ids).await?;
    assemble(rows, items)
}

/// All orders with buyer usernames, newest first.
pub async fn list_all(pool: &PgPool) -> ServiceResult<Vec<OrderDetail>> {
    let rows = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT o.id, o.user_id, u.username, o.status, o.total_price,
               o.received_date, o.created_at
        FROM orders o
        LEFT JOIN users u ON u.id = o.user_id
        ORDER BY o.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = fetch_items(pool, &ids).await?;
    assemble(rows, items)
}

pub async fn find_detail(pool: &PgPool, order_id: Uuid) -> ServiceResult<Option<OrderDetail>> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT o.id, o.user_id, u.username, o.status, o.total_price,
               o.received_date, o.created_at
        FROM orders o
        LEFT JOIN users u ON u.id = o.user_id
        WHERE o.id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut items = fetch_items(pool, &[row.id]).await?;
    let order_items = items.remove(&row.id).unwrap_or_default();
    Ok(Some(into_detail(row, order_items)?))
}

/// Set an order's status. Any transition between known statuses is allowed.
pub async fn set_status(
    pool: &PgPool,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
        .bind(order_id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
