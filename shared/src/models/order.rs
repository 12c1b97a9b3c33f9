//! Order models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::weapon::WeaponCategory;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the DB text representation
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Returned to the buyer when an order is placed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: Uuid,
    pub total_price: Decimal,
}

/// Current catalog details attached to an order line.
///
/// `None` on the line means the weapon has since been removed from the
/// catalog; the frozen purchase price and quantity are still intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSummary {
    pub id: Uuid,
    pub name: String,
    pub category: WeaponCategory,
    pub image: Option<String>,
}

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDetail {
    pub id: Uuid,
    pub weapon: Option<WeaponSummary>,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

/// A full order with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Buyer username, populated on admin views
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub received_date: Option<NaiveDate>,
    pub created_at: i64,
    pub items: Vec<OrderItemDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Rejected,
        ] {
            assert_eq!(OrderStatus::from_db(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("shipped"), None);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: OrderStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, OrderStatus::Rejected);
    }
}
