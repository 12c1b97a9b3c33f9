//! Order placement — the one write path that creates orders
//!
//! Everything stock-related happens inside a single Postgres transaction:
//! the buyer row is re-read fresh, every cart line locks its weapon row with
//! `SELECT ... FOR UPDATE`, stock is decremented, and the order aggregate is
//! inserted. Any failure drops the transaction and rolls all of it back, so
//! no partial order or stock change is ever visible.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};
use shared::license;
use shared::models::{OrderReceipt, OrderStatus};
use shared::util::now_millis;

use crate::auth::Identity;
use crate::db::orders::{NewOrder, NewOrderItem};
use crate::db::weapons::ReservedLine;
use crate::db::{orders, users, weapons};
use crate::error::ServiceResult;

/// One cart line as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub weapon_id: Uuid,
    pub quantity: i32,
}

/// POST /api/orders request body.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLine>,
    pub received_date: Option<NaiveDate>,
}

/// Cheap request validation, done before any DB work.
fn validate_request(req: &PlaceOrderRequest, today: NaiveDate) -> Result<(), AppError> {
    if req.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    for line in &req.items {
        if line.quantity < 1 {
            return Err(AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("weapon_id", line.weapon_id.to_string())
                .with_detail("quantity", line.quantity));
        }
    }
    if let Some(date) = req.received_date
        && date < today
    {
        return Err(AppError::new(ErrorCode::ReceivedDateInPast)
            .with_detail("received_date", date.to_string()));
    }
    Ok(())
}

/// Pure order assembly: freeze unit prices into lines, sum the total.
fn build_order(
    user_id: Uuid,
    lines: &[ReservedLine],
    received_date: Option<NaiveDate>,
) -> (NewOrder, Vec<NewOrderItem>) {
    let total_price: Decimal = lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum();

    let order = NewOrder {
        id: Uuid::new_v4(),
        user_id,
        status: OrderStatus::Pending,
        total_price,
        received_date,
        created_at: now_millis(),
    };

    let items = lines
        .iter()
        .map(|line| NewOrderItem {
            id: Uuid::new_v4(),
            weapon_id: line.weapon_id,
            quantity: line.quantity,
            price_at_purchase: line.unit_price,
        })
        .collect();

    (order, items)
}

/// Place an order for the authenticated buyer.
pub async fn place_order(
    pool: &PgPool,
    buyer: &Identity,
    req: PlaceOrderRequest,
) -> ServiceResult<OrderReceipt> {
    validate_request(&req, chrono::Utc::now().date_naive())?;

    let mut tx = pool.begin().await?;

    // Re-read the buyer inside the transaction; the token alone is not
    // trusted for verification state or license level.
    let buyer_row = users::find_by_id(&mut *tx, buyer.user_id).await?.ok_or_else(|| {
        tracing::error!(user_id = %buyer.user_id, "authenticated buyer has no user row");
        AppError::new(ErrorCode::BuyerNotFound)
    })?;

    if !buyer_row.is_verified {
        return Err(AppError::new(ErrorCode::AccountNotVerified).into());
    }

    let buyer_level = license::derive_level(buyer_row.license_number.as_deref());

    // Lock weapon rows in a canonical order so two carts sharing weapons
    // cannot deadlock each other.
    let mut lines = req.items;
    lines.sort_by_key(|line| line.weapon_id);

    let mut reserved = Vec::with_capacity(lines.len());
    for line in &lines {
        let locked =
            weapons::reserve_and_decrement(&mut *tx, line.weapon_id, line.quantity).await?;

        if !license::is_eligible(buyer_level, locked.required_license_level) {
            return Err(AppError::new(ErrorCode::LicenseInsufficient)
                .with_detail("weapon", locked.name)
                .with_detail("required_level", locked.required_license_level)
                .with_detail("buyer_level", buyer_level)
                .into());
        }

        reserved.push(locked);
    }

    let (order, items) = build_order(buyer.user_id, &reserved, req.received_date);
    orders::insert_order_with_items(&mut *tx, &order, &items).await?;

    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %buyer.user_id,
        total = %order.total_price,
        lines = items.len(),
        "order placed"
    );

    Ok(OrderReceipt {
        order_id: order.id,
        total_price: order.total_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i32) -> OrderLine {
        OrderLine {
            weapon_id: Uuid::new_v4(),
            quantity,
        }
    }

    fn reserved(unit_price: Decimal, required_level: i32, quantity: i32) -> ReservedLine {
        ReservedLine {
            weapon_id: Uuid::new_v4(),
            name: "Test Rifle".into(),
            unit_price,
            required_license_level: required_level,
            quantity,
        }
    }

    const TODAY: &str = "2026-08-28";

    fn today() -> NaiveDate {
        TODAY.parse().unwrap()
    }

    #[test]
    fn test_validate_rejects_empty_cart() {
        let req = PlaceOrderRequest {
            items: vec![],
            received_date: None,
        };
        let err = validate_request(&req, today()).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        for quantity in [0, -3] {
            let req = PlaceOrderRequest {
                items: vec![line(quantity)],
                received_date: None,
            };
            let err = validate_request(&req, today()).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidQuantity);
        }
    }

    #[test]
    fn test_validate_rejects_past_date() {
        let req = PlaceOrderRequest {
            items: vec![line(1)],
            received_date: Some("2026-08-27".parse().unwrap()),
        };
        let err = validate_request(&req, today()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ReceivedDateInPast);
    }

    #[test]
    fn test_validate_accepts_today_and_future() {
        for date in [TODAY, "2026-09-01"] {
            let req = PlaceOrderRequest {
                items: vec![line(2)],
                received_date: Some(date.parse().unwrap()),
            };
            assert!(validate_request(&req, today()).is_ok());
        }
    }

    #[test]
    fn test_build_order_total() {
        let user_id = Uuid::new_v4();
        let lines = vec![
            reserved(dec!(10.00), 0, 2),
            reserved(dec!(5.00), 1, 3),
        ];

        let (order, items) = build_order(user_id, &lines, None);

        assert_eq!(order.total_price, dec!(35.00));
        assert_eq!(order.user_id, user_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_build_order_freezes_unit_price() {
        let lines = vec![reserved(dec!(1299.99), 3, 1)];
        let (_, items) = build_order(Uuid::new_v4(), &lines, None);
        assert_eq!(items[0].price_at_purchase, dec!(1299.99));
        assert_eq!(items[0].weapon_id, lines[0].weapon_id);
    }

    #[test]
    fn test_build_order_keeps_received_date() {
        let date: NaiveDate = "2026-09-15".parse().unwrap();
        let lines = vec![reserved(dec!(20.00), 0, 1)];
        let (order, _) = build_order(Uuid::new_v4(), &lines, Some(date));
        assert_eq!(order.received_date, Some(date));
    }
}
