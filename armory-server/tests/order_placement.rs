//! Order placement integration tests — require a live Postgres
//!
//! Run with:
//!   DATABASE_URL=postgres://... cargo test -p armory-server -- --ignored

use armory_server::auth::Identity;
use armory_server::db::{orders, weapons};
use armory_server::error::ServiceError;
use armory_server::services::orders::{OrderLine, PlaceOrderRequest, place_order};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::error::ErrorCode;
use shared::models::{OrderStatus, Role, WeaponCategory, WeaponCreate};
use shared::util::now_millis;
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for DB tests");
    let pool = PgPool::connect(&url).await.expect("connect to Postgres");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

async fn seed_user(pool: &PgPool, license_number: Option<&str>, is_verified: bool) -> Identity {
    let username = format!("buyer-{}", Uuid::new_v4());
    let row = armory_server::db::users::insert(
        pool,
        &username,
        "$argon2id$fake-hash-for-tests",
        Role::User,
        license_number,
        now_millis(),
    )
    .await
    .expect("insert user");

    sqlx::query("UPDATE users SET is_verified = $2 WHERE id = $1")
        .bind(row.id)
        .bind(is_verified)
        .execute(pool)
        .await
        .expect("set verification");

    Identity {
        user_id: row.id,
        username,
        role: Role::User,
    }
}

async fn seed_weapon(pool: &PgPool, price: Decimal, stock: i32, required_level: i32) -> Uuid {
    let row = weapons::insert(
        pool,
        &WeaponCreate {
            name: format!("Test Rifle {}", Uuid::new_v4()),
            description: "integration test item".into(),
            price,
            stock,
            category: WeaponCategory::Light,
            required_license_level: required_level,
            image: None,
        },
    )
    .await
    .expect("insert weapon");
    row.id
}

async fn current_stock(pool: &PgPool, weapon_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT stock FROM weapons WHERE id = $1")
        .bind(weapon_id)
        .fetch_one(pool)
        .await
        .expect("fetch stock")
}

fn request(items: Vec<OrderLine>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        items,
        received_date: None,
    }
}

fn app_code(err: ServiceError) -> ErrorCode {
    match err {
        ServiceError::App(e) => e.code,
        ServiceError::Db(e) => panic!("expected business error, got DB error: {e}"),
    }
}

#[tokio::test]
#[ignore]
async fn place_order_decrements_stock_and_freezes_price() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, Some("2"), true).await;
    let rifle = seed_weapon(&pool, dec!(10.00), 5, 0).await;
    let pistol = seed_weapon(&pool, dec!(5.00), 10, 1).await;

    let receipt = place_order(
        &pool,
        &buyer,
        request(vec![
            OrderLine {
                weapon_id: rifle,
                quantity: 2,
            },
            OrderLine {
                weapon_id: pistol,
                quantity: 3,
            },
        ]),
    )
    .await
    .expect("order should succeed");

    assert_eq!(receipt.total_price, dec!(35.00));
    assert_eq!(current_stock(&pool, rifle).await, 3);
    assert_eq!(current_stock(&pool, pistol).await, 7);

    // Raise the catalog price; the frozen line must not move.
    sqlx::query("UPDATE weapons SET price = $2 WHERE id = $1")
        .bind(rifle)
        .bind(dec!(99.99))
        .execute(&pool)
        .await
        .unwrap();

    let detail = orders::find_detail(&pool, receipt.order_id)
        .await
        .expect("query order")
        .expect("order exists");
    assert_eq!(detail.status, OrderStatus::Pending);
    assert_eq!(detail.total_price, dec!(35.00));
    assert_eq!(detail.items.len(), 2);
    let frozen = detail
        .items
        .iter()
        .find(|i| i.weapon.as_ref().is_some_and(|w| w.id == rifle))
        .expect("rifle line present");
    assert_eq!(frozen.price_at_purchase, dec!(10.00));
}

#[tokio::test]
#[ignore]
async fn insufficient_stock_rolls_back_whole_order() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, Some("5"), true).await;
    let plenty = seed_weapon(&pool, dec!(10.00), 100, 0).await;
    let scarce = seed_weapon(&pool, dec!(10.00), 1, 0).await;

    let err = place_order(
        &pool,
        &buyer,
        request(vec![
            OrderLine {
                weapon_id: plenty,
                quantity: 10,
            },
            OrderLine {
                weapon_id: scarce,
                quantity: 2,
            },
        ]),
    )
    .await
    .expect_err("order should fail");
    assert_eq!(app_code(err), ErrorCode::InsufficientStock);

    // Nothing moved: the decrement on the first line was rolled back too.
    assert_eq!(current_stock(&pool, plenty).await, 100);
    assert_eq!(current_stock(&pool, scarce).await, 1);

    let order_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(buyer.user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(order_count, 0);
}

#[tokio::test]
#[ignore]
async fn concurrent_orders_cannot_oversell() {
    let pool = test_pool().await;
    let buyer_a = seed_user(&pool, None, true).await;
    let buyer_b = seed_user(&pool, None, true).await;
    let last_one = seed_weapon(&pool, dec!(50.00), 1, 0).await;

    let line = || {
        request(vec![OrderLine {
            weapon_id: last_one,
            quantity: 1,
        }])
    };

    let (a, b) = tokio::join!(
        place_order(&pool, &buyer_a, line()),
        place_order(&pool, &buyer_b, line()),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one buyer gets the last unit");

    let failure = match (a, b) {
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => e,
        other => panic!("expected one success and one failure, got {other:?}"),
    };
    assert_eq!(app_code(failure), ErrorCode::InsufficientStock);
    assert_eq!(current_stock(&pool, last_one).await, 0);
}

#[tokio::test]
#[ignore]
async fn license_gate_blocks_underlicensed_buyer() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, Some("2"), true).await;
    let heavy = seed_weapon(&pool, dec!(500.00), 5, 3).await;

    let err = place_order(
        &pool,
        &buyer,
        request(vec![OrderLine {
            weapon_id: heavy,
            quantity: 1,
        }]),
    )
    .await
    .expect_err("level 2 cannot buy level 3 gear");
    assert_eq!(app_code(err), ErrorCode::LicenseInsufficient);
    assert_eq!(current_stock(&pool, heavy).await, 5);
}

#[tokio::test]
#[ignore]
async fn garbage_license_fails_closed() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, Some("LIC-2024-X"), true).await;
    let gated = seed_weapon(&pool, dec!(100.00), 5, 1).await;

    let err = place_order(
        &pool,
        &buyer,
        request(vec![OrderLine {
            weapon_id: gated,
            quantity: 1,
        }]),
    )
    .await
    .expect_err("unparseable license means level 0");
    assert_eq!(app_code(err), ErrorCode::LicenseInsufficient);
}

#[tokio::test]
#[ignore]
async fn unverified_buyer_cannot_order() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, Some("5"), false).await;
    let rifle = seed_weapon(&pool, dec!(10.00), 5, 0).await;

    let err = place_order(
        &pool,
        &buyer,
        request(vec![OrderLine {
            weapon_id: rifle,
            quantity: 1,
        }]),
    )
    .await
    .expect_err("unverified account must be rejected");
    assert_eq!(app_code(err), ErrorCode::AccountNotVerified);
    assert_eq!(current_stock(&pool, rifle).await, 5);
}

#[tokio::test]
#[ignore]
async fn unknown_weapon_fails_order() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, None, true).await;

    let err = place_order(
        &pool,
        &buyer,
        request(vec![OrderLine {
            weapon_id: Uuid::new_v4(),
            quantity: 1,
        }]),
    )
    .await
    .expect_err("unknown weapon must fail");
    assert_eq!(app_code(err), ErrorCode::WeaponNotFound);
}

#[tokio::test]
#[ignore]
async fn status_updates_are_permissive() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, None, true).await;
    let rifle = seed_weapon(&pool, dec!(10.00), 5, 0).await;

    let receipt = place_order(
        &pool,
        &buyer,
        request(vec![OrderLine {
            weapon_id: rifle,
            quantity: 1,
        }]),
    )
    .await
    .expect("order should succeed");

    for status in [
        OrderStatus::Approved,
        OrderStatus::Rejected,
        OrderStatus::Pending,
    ] {
        assert!(
            orders::set_status(&pool, receipt.order_id, status)
                .await
                .expect("status update")
        );
        let detail = orders::find_detail(&pool, receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.status, status);
    }
}

#[tokio::test]
#[ignore]
async fn my_orders_lists_newest_first_and_only_own() {
    let pool = test_pool().await;
    let buyer = seed_user(&pool, None, true).await;
    let other = seed_user(&pool, None, true).await;
    let rifle = seed_weapon(&pool, dec!(10.00), 50, 0).await;

    let one_line = |qty| {
        request(vec![OrderLine {
            weapon_id: rifle,
            quantity: qty,
        }])
    };

    let first = place_order(&pool, &buyer, one_line(1)).await.unwrap();
    let second = place_order(&pool, &buyer, one_line(2)).await.unwrap();
    place_order(&pool, &other, one_line(1)).await.unwrap();

    let mine = orders::list_for_user(&pool, buyer.user_id).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|o| o.user_id == buyer.user_id));
    let ids: Vec<Uuid> = mine.iter().map(|o| o.id).collect();
    assert!(ids.contains(&first.order_id));
    assert!(ids.contains(&second.order_id));
    assert!(mine[0].created_at >= mine[1].created_at);
}
