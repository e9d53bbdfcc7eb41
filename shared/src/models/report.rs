//! Read-side report models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LossReason;
use crate::types::DateRange;

/// Purchase value of the stock held for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductValuation {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: Decimal,
    pub value: Decimal,
}

/// Purchase value of all active stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryValuation {
    pub total_value: Decimal,
    pub batch_count: i64,
    pub by_product: Vec<ProductValuation>,
}

/// Dashboard figures for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardKpis {
    pub date: NaiveDate,
    pub inventory_value: Decimal,
    pub loss_quantity: Decimal,
    pub critical_products: usize,
    pub sale_count: i64,
    pub sales_total: Decimal,
}

/// One sale line of a sales report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReportRow {
    pub sale_id: Uuid,
    pub sold_at: DateTime<Utc>,
    pub item_count: i64,
    pub total_amount: Decimal,
}

/// Sales made within a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub range: DateRange,
    pub sales: Vec<SaleReportRow>,
    pub sale_count: usize,
    pub total_amount: Decimal,
}

/// One loss line of a loss report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossReportRow {
    pub loss_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub product_name: String,
    pub quantity: Decimal,
    pub reason: LossReason,
    pub note: Option<String>,
}

/// Losses recorded within a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossReport {
    pub range: DateRange,
    pub losses: Vec<LossReportRow>,
    pub loss_count: usize,
    pub total_quantity: Decimal,
}
