//! Stock alert models and the critical-stock rule

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product whose stock is positive but under its minimum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriticalProduct {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub total_stock: Decimal,
    pub min_stock: Decimal,
}

/// Stock condition of a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Healthy,
}

impl StockStatus {
    /// Classify a product's total stock against its minimum.
    ///
    /// Zero stock is out of stock, not critical. Stock equal to the
    /// minimum is healthy.
    pub fn classify(total_stock: Decimal, min_stock: Decimal) -> Self {
        if total_stock <= Decimal::ZERO {
            StockStatus::OutOfStock
        } else if total_stock < min_stock {
            StockStatus::Critical
        } else {
            StockStatus::Healthy
        }
    }
}

/// Whether a product with this stock should raise a low-stock alert
pub fn is_critical(total_stock: Decimal, min_stock: Decimal) -> bool {
    StockStatus::classify(total_stock, min_stock) == StockStatus::Critical
}
