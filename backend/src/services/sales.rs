//! Sale processing: one sale consumes stock FIFO and records a line per batch

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::{decimal_text, parse_decimal, Store};
use crate::error::{AppError, AppResult};
use crate::services::ledger::apply_fifo;
use crate::services::products::find_live_by_sku;
use shared::{
    checked_total, ensure_quantity, line_subtotal, normalize_sku, DateRange, Sale, SaleItem,
    SaleSummary, SaleWithItems,
};

/// Input for selling a quantity of one product
#[derive(Debug, Clone, Deserialize)]
pub struct SellInput {
    pub sku: String,
    pub quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    total_amount: String,
    sold_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> AppResult<Self> {
        Ok(Sale {
            id: row.id,
            total_amount: parse_decimal("total_amount", &row.total_amount)?,
            sold_at: row.sold_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: Uuid,
    sale_id: Uuid,
    line_no: i64,
    product_id: Uuid,
    batch_id: Uuid,
    quantity: String,
    unit_price: String,
    subtotal: String,
}

impl TryFrom<SaleItemRow> for SaleItem {
    type Error = AppError;

    fn try_from(row: SaleItemRow) -> AppResult<Self> {
        Ok(SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            line_no: row.line_no,
            product_id: row.product_id,
            batch_id: row.batch_id,
            quantity: parse_decimal("quantity", &row.quantity)?,
            unit_price: parse_decimal("unit_price", &row.unit_price)?,
            subtotal: parse_decimal("subtotal", &row.subtotal)?,
        })
    }
}

/// Sale service
#[derive(Clone)]
pub struct SaleService {
    store: Store,
}

impl SaleService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Sell `quantity` of the product with `sku`.
    ///
    /// Batches, sale header and sale items are written in one transaction.
    /// On any error nothing is written.
    pub async fn sell(&self, sku: &str, quantity: Decimal) -> AppResult<SaleSummary> {
        ensure_quantity(quantity)?;
        let sku = normalize_sku(sku);
        let sold_at = Utc::now();

        let mut tx = self.store.begin_write().await?;

        let product = match find_live_by_sku(tx.conn(), &sku).await? {
            Some(product) => product,
            None => {
                tracing::warn!(sku = %sku, "Sale rejected: unknown SKU");
                return Err(AppError::ProductNotFound(sku));
            }
        };

        let consumed = match apply_fifo(tx.conn(), product.id, quantity, sold_at).await {
            Ok(consumed) => consumed,
            Err(err) => {
                tracing::warn!(sku = %sku, quantity = %quantity, "Sale rejected: {}", err);
                return Err(err);
            }
        };

        let sale_id = Uuid::new_v4();
        let items = consumed
            .iter()
            .enumerate()
            .map(|(i, c)| -> AppResult<SaleItem> {
                Ok(SaleItem {
                    id: Uuid::new_v4(),
                    sale_id,
                    line_no: i as i64 + 1,
                    product_id: product.id,
                    batch_id: c.batch_id,
                    quantity: c.taken,
                    unit_price: product.sale_price,
                    subtotal: line_subtotal(c.taken, product.sale_price)?,
                })
            })
            .collect::<AppResult<Vec<SaleItem>>>()?;
        let total_amount = checked_total(items.iter().map(|i| i.subtotal), "sale total")?;

        sqlx::query("INSERT INTO sales (id, total_amount, sold_at) VALUES (?, ?, ?)")
            .bind(sale_id)
            .bind(decimal_text(total_amount))
            .bind(sold_at)
            .execute(tx.conn())
            .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, product_id, batch_id, quantity, unit_price, subtotal
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(item.id)
            .bind(item.sale_id)
            .bind(item.line_no)
            .bind(item.product_id)
            .bind(item.batch_id)
            .bind(decimal_text(item.quantity))
            .bind(decimal_text(item.unit_price))
            .bind(decimal_text(item.subtotal))
            .execute(tx.conn())
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            sale_id = %sale_id,
            sku = %sku,
            quantity = %quantity,
            total = %total_amount,
            lines = items.len(),
            "Sale recorded"
        );

        Ok(SaleSummary {
            sale_id,
            total_amount,
            line_count: items.len(),
            quantity,
            sold_at,
        })
    }

    /// Line items of a sale in line order
    pub async fn sale_items(&self, sale_id: Uuid) -> AppResult<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT id, sale_id, line_no, product_id, batch_id, quantity, unit_price, subtotal
            FROM sale_items
            WHERE sale_id = ?
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(self.store.pool())
        .await?;

        rows.into_iter().map(SaleItem::try_from).collect()
    }

    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<SaleWithItems> {
        let row = sqlx::query_as::<_, SaleRow>(
            "SELECT id, total_amount, sold_at FROM sales WHERE id = ?",
        )
        .bind(sale_id)
        .fetch_optional(self.store.pool())
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        Ok(SaleWithItems {
            sale: Sale::try_from(row)?,
            items: self.sale_items(sale_id).await?,
        })
    }

    /// Sales made on one UTC day, oldest first
    pub async fn sales_on(&self, date: NaiveDate) -> AppResult<Vec<Sale>> {
        let (from, until) = DateRange::single_day(date).utc_bounds();
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, total_amount, sold_at
            FROM sales
            WHERE sold_at >= ? AND sold_at < ?
            ORDER BY sold_at
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(self.store.pool())
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }
}
