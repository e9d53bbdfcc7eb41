//! Read-side reports: inventory valuation, daily dashboard, sales and losses

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::db::{parse_decimal, Store};
use crate::error::{AppError, AppResult};
use crate::services::alerts::stock_levels;
use shared::{
    checked_add, checked_total, DashboardKpis, DateRange, InventoryValuation, LossReport, LossReportRow, ProductValuation,
    SaleReportRow, SalesReport, StockStatus,
};

#[derive(Debug, FromRow)]
struct ValuationRow {
    product_id: Uuid,
    sku: String,
    name: String,
    remaining: String,
    unit_cost: String,
}

#[derive(Debug, FromRow)]
struct SaleReportRecord {
    id: Uuid,
    sold_at: DateTime<Utc>,
    total_amount: String,
    item_count: i64,
}

#[derive(Debug, FromRow)]
struct LossReportRecord {
    id: Uuid,
    recorded_at: DateTime<Utc>,
    product_name: String,
    quantity: String,
    reason: String,
    note: Option<String>,
}

async fn valuation(conn: &mut SqliteConnection) -> AppResult<InventoryValuation> {
    let rows = sqlx::query_as::<_, ValuationRow>(
        r#"
        SELECT b.product_id, p.sku, p.name, b.remaining, b.unit_cost
        FROM batches b
        JOIN products p ON p.id = b.product_id
        WHERE b.deleted_at IS NULL AND p.deleted_at IS NULL
        ORDER BY p.name, p.id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut by_product: Vec<ProductValuation> = Vec::new();
    let mut batch_count = 0i64;
    for row in rows {
        let remaining = parse_decimal("remaining", &row.remaining)?;
        if remaining <= Decimal::ZERO {
            continue;
        }
        let value = remaining
            .checked_mul(parse_decimal("unit_cost", &row.unit_cost)?)
            .ok_or_else(|| AppError::Internal(format!("batch value overflow for {}", row.sku)))?;
        batch_count += 1;

        match by_product.last_mut() {
            Some(last) if last.product_id == row.product_id => {
                last.quantity = checked_add(last.quantity, remaining, "stock quantity")?;
                last.value = checked_add(last.value, value, "stock value")?;
            }
            _ => by_product.push(ProductValuation {
                product_id: row.product_id,
                sku: row.sku,
                name: row.name,
                quantity: remaining,
                value,
            }),
        }
    }

    Ok(InventoryValuation {
        total_value: checked_total(by_product.iter().map(|p| p.value), "inventory value")?,
        batch_count,
        by_product,
    })
}

async fn sale_rows(conn: &mut SqliteConnection, range: DateRange) -> AppResult<Vec<SaleReportRow>> {
    let (from, until) = range.utc_bounds();
    let records = sqlx::query_as::<_, SaleReportRecord>(
        r#"
        SELECT s.id, s.sold_at, s.total_amount,
               (SELECT COUNT(*) FROM sale_items i WHERE i.sale_id = s.id) AS item_count
        FROM sales s
        WHERE s.sold_at >= ? AND s.sold_at < ?
        ORDER BY s.sold_at
        "#,
    )
    .bind(from)
    .bind(until)
    .fetch_all(&mut *conn)
    .await?;

    records
        .into_iter()
        .map(|r| -> AppResult<SaleReportRow> {
            Ok(SaleReportRow {
                sale_id: r.id,
                sold_at: r.sold_at,
                item_count: r.item_count,
                total_amount: parse_decimal("total_amount", &r.total_amount)?,
            })
        })
        .collect()
}

async fn loss_rows(conn: &mut SqliteConnection, range: DateRange) -> AppResult<Vec<LossReportRow>> {
    let (from, until) = range.utc_bounds();
    let records = sqlx::query_as::<_, LossReportRecord>(
        r#"
        SELECT l.id, l.recorded_at, p.name AS product_name, l.quantity, l.reason, l.note
        FROM losses l
        JOIN products p ON p.id = l.product_id
        WHERE l.recorded_at >= ? AND l.recorded_at < ?
        ORDER BY l.recorded_at
        "#,
    )
    .bind(from)
    .bind(until)
    .fetch_all(&mut *conn)
    .await?;

    records
        .into_iter()
        .map(|r| -> AppResult<LossReportRow> {
            Ok(LossReportRow {
                loss_id: r.id,
                recorded_at: r.recorded_at,
                product_name: r.product_name,
                quantity: parse_decimal("quantity", &r.quantity)?,
                reason: r.reason.parse().map_err(AppError::Internal)?,
                note: r.note,
            })
        })
        .collect()
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Store,
    default_min_stock: Decimal,
}

impl ReportingService {
    pub fn new(store: Store, default_min_stock: Decimal) -> Self {
        Self {
            store,
            default_min_stock,
        }
    }

    /// Purchase value of all active stock
    pub async fn inventory_valuation(&self) -> AppResult<InventoryValuation> {
        let mut conn = self.store.pool().acquire().await?;
        valuation(&mut conn).await
    }

    /// Dashboard figures for `date`, read from a single snapshot
    pub async fn dashboard(&self, date: NaiveDate) -> AppResult<DashboardKpis> {
        let day = DateRange::single_day(date);
        let mut tx = self.store.pool().begin().await?;

        let inventory = valuation(&mut tx).await?;
        let losses = loss_rows(&mut tx, day).await?;
        let sales = sale_rows(&mut tx, day).await?;
        let critical_products = stock_levels(&mut tx, self.default_min_stock)
            .await?
            .iter()
            .filter(|l| l.status() == StockStatus::Critical)
            .count();
        tx.commit().await?;

        Ok(DashboardKpis {
            date,
            inventory_value: inventory.total_value,
            loss_quantity: checked_total(losses.iter().map(|l| l.quantity), "loss quantity")?,
            critical_products,
            sale_count: sales.len() as i64,
            sales_total: checked_total(sales.iter().map(|s| s.total_amount), "sales total")?,
        })
    }

    /// Sales within an inclusive range of days
    pub async fn sales_report(&self, range: DateRange) -> AppResult<SalesReport> {
        let mut conn = self.store.pool().acquire().await?;
        let sales = sale_rows(&mut conn, range).await?;

        Ok(SalesReport {
            range,
            sale_count: sales.len(),
            total_amount: checked_total(sales.iter().map(|s| s.total_amount), "sales total")?,
            sales,
        })
    }

    /// Losses within an inclusive range of days
    pub async fn loss_report(&self, range: DateRange) -> AppResult<LossReport> {
        let mut conn = self.store.pool().acquire().await?;
        let losses = loss_rows(&mut conn, range).await?;

        Ok(LossReport {
            range,
            loss_count: losses.len(),
            total_quantity: checked_total(losses.iter().map(|l| l.quantity), "loss quantity")?,
            losses,
        })
    }
}
