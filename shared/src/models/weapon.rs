//! Catalog (weapon) models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponCategory {
    Light,
    Heavy,
    Explosive,
}

impl WeaponCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Heavy => "heavy",
            Self::Explosive => "explosive",
        }
    }

    /// Parse the DB text representation
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "heavy" => Some(Self::Heavy),
            "explosive" => Some(Self::Explosive),
            _ => None,
        }
    }
}

/// A catalog item as exposed by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: WeaponCategory,
    pub required_license_level: i32,
    pub image: Option<String>,
    pub updated_at: i64,
}

/// Admin payload for creating a catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponCreate {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: WeaponCategory,
    pub required_license_level: i32,
    pub image: Option<String>,
}

/// Admin payload for a partial catalog update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<WeaponCategory>,
    pub required_license_level: Option<i32>,
    pub image: Option<String>,
}

/// One page of catalog results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponPage {
    pub data: Vec<Weapon>,
    pub total: i64,
    pub page: i64,
    pub last_page: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_db_roundtrip() {
        for cat in [
            WeaponCategory::Light,
            WeaponCategory::Heavy,
            WeaponCategory::Explosive,
        ] {
            assert_eq!(WeaponCategory::from_db(cat.as_str()), Some(cat));
        }
        assert_eq!(WeaponCategory::from_db("medium"), None);
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&WeaponCategory::Explosive).unwrap();
        assert_eq!(json, "\"explosive\"");
        let cat: WeaponCategory = serde_json::from_str("\"heavy\"").unwrap();
        assert_eq!(cat, WeaponCategory::Heavy);
    }
}
