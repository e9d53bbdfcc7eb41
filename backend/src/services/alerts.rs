//! Stock alerts: products running low or out of stock

use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::db::{parse_optional_decimal, Store};
use crate::error::AppResult;
use shared::{checked_add, CriticalProduct, StockStatus};

/// Aggregated active stock of one live product
#[derive(Debug, Clone)]
pub(crate) struct StockLevel {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub min_stock: Decimal,
    pub total_stock: Decimal,
}

impl StockLevel {
    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.total_stock, self.min_stock)
    }
}

#[derive(Debug, FromRow)]
struct StockRow {
    id: Uuid,
    sku: String,
    name: String,
    min_stock: Option<String>,
    remaining: Option<String>,
}

/// Sum active stock per live product in a single statement
pub(crate) async fn stock_levels(
    conn: &mut SqliteConnection,
    default_min_stock: Decimal,
) -> AppResult<Vec<StockLevel>> {
    let rows = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT p.id, p.sku, p.name, p.min_stock, b.remaining
        FROM products p
        LEFT JOIN batches b ON b.product_id = p.id AND b.deleted_at IS NULL
        WHERE p.deleted_at IS NULL
        ORDER BY p.name, p.id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut levels: Vec<StockLevel> = Vec::new();
    for row in rows {
        let remaining = parse_optional_decimal("remaining", row.remaining.as_deref())?;

        if levels.last().map_or(true, |l| l.product_id != row.id) {
            let min_stock = parse_optional_decimal("min_stock", row.min_stock.as_deref())?
                .unwrap_or(default_min_stock);
            levels.push(StockLevel {
                product_id: row.id,
                sku: row.sku,
                name: row.name,
                min_stock,
                total_stock: Decimal::ZERO,
            });
        }

        if let (Some(qty), Some(level)) = (remaining, levels.last_mut()) {
            if qty > Decimal::ZERO {
                level.total_stock = checked_add(level.total_stock, qty, "product stock")?;
            }
        }
    }
    Ok(levels)
}

/// Stock alert service
#[derive(Clone)]
pub struct StockAlertService {
    store: Store,
    default_min_stock: Decimal,
}

impl StockAlertService {
    pub fn new(store: Store, default_min_stock: Decimal) -> Self {
        Self {
            store,
            default_min_stock,
        }
    }

    /// Products with positive stock below their minimum
    pub async fn critical_products(&self) -> AppResult<Vec<CriticalProduct>> {
        let mut conn = self.store.pool().acquire().await?;
        let critical: Vec<CriticalProduct> = stock_levels(&mut conn, self.default_min_stock)
            .await?
            .into_iter()
            .filter(|l| l.status() == StockStatus::Critical)
            .map(|l| CriticalProduct {
                product_id: l.product_id,
                sku: l.sku,
                name: l.name,
                total_stock: l.total_stock,
                min_stock: l.min_stock,
            })
            .collect();

        tracing::debug!(count = critical.len(), "Critical stock evaluated");
        Ok(critical)
    }

    /// Live products with no active stock at all
    pub async fn out_of_stock_products(&self) -> AppResult<Vec<CriticalProduct>> {
        let mut conn = self.store.pool().acquire().await?;
        let empty = stock_levels(&mut conn, self.default_min_stock)
            .await?
            .into_iter()
            .filter(|l| l.status() == StockStatus::OutOfStock)
            .map(|l| CriticalProduct {
                product_id: l.product_id,
                sku: l.sku,
                name: l.name,
                total_stock: l.total_stock,
                min_stock: l.min_stock,
            })
            .collect();
        Ok(empty)
    }
}
