//! Product catalogue models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum stock used when a product has no threshold configured
pub const DEFAULT_MIN_STOCK: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Unit of measure given to products created through intake
pub const DEFAULT_UNIT_OF_MEASURE: &str = "kg";

/// A product sold by the shop, identified by its SKU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    /// Business key, unique among live products and never edited
    pub sku: String,
    pub name: String,
    pub unit_of_measure: String,
    pub sale_price: Decimal,
    pub min_stock: Option<Decimal>,
    pub category: Option<ProductCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Threshold below which positive stock is considered critical
    pub fn effective_min_stock(&self, fallback: Decimal) -> Decimal {
        self.min_stock.unwrap_or(fallback)
    }
}

/// Product category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Fruits,
    Vegetables,
    #[default]
    Other,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Fruits => "fruits",
            ProductCategory::Vegetables => "vegetables",
            ProductCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductCategory::Fruits => write!(f, "Fruits"),
            ProductCategory::Vegetables => write!(f, "Vegetables"),
            ProductCategory::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fruits" => Ok(ProductCategory::Fruits),
            "vegetables" => Ok(ProductCategory::Vegetables),
            "other" => Ok(ProductCategory::Other),
            other => Err(format!("unknown product category '{}'", other)),
        }
    }
}

/// A product together with its current active stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStock {
    #[serde(flatten)]
    pub product: Product,
    pub total_stock: Decimal,
    pub active_batches: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_min_stock() {
        assert_eq!(DEFAULT_MIN_STOCK, dec!(5));
    }

    #[test]
    fn test_category_round_trip_str() {
        for c in [
            ProductCategory::Fruits,
            ProductCategory::Vegetables,
            ProductCategory::Other,
        ] {
            assert_eq!(c.as_str().parse::<ProductCategory>().unwrap(), c);
        }
        assert!("meat".parse::<ProductCategory>().is_err());
    }
}
