//! Batch ledger: per-product FIFO queues of dated batches
//!
//! Consumption plans come from [`shared::fifo`]; this module applies them to
//! the `batches` table. The `pub(crate)` helpers take an open connection so
//! sales and losses can apply ledger mutations inside their own transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::db::{decimal_text, parse_decimal, Store};
use crate::error::{AppError, AppResult};
use crate::services::products::{find_live_by_id, find_live_by_sku, insert_product};
use shared::{
    ensure_quantity, normalize_sku, plan_batch_take, plan_fifo, validate_min_stock,
    validate_product_name, validate_sale_price, validate_sku, validate_unit_cost, Allocation,
    Batch, BatchLevel, Consumption, IntakeReceipt, Product, ProductCategory,
    DEFAULT_UNIT_OF_MEASURE,
};

const BATCH_COLUMNS: &str = "id, product_id, seq, intake_date, expiry_date, unit_cost, \
     initial_quantity, remaining, created_at, updated_at";

/// Batch row as stored
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    product_id: Uuid,
    seq: i64,
    intake_date: NaiveDate,
    expiry_date: NaiveDate,
    unit_cost: String,
    initial_quantity: String,
    remaining: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for Batch {
    type Error = AppError;

    fn try_from(row: BatchRow) -> AppResult<Self> {
        Ok(Batch {
            id: row.id,
            product_id: row.product_id,
            seq: row.seq,
            intake_date: row.intake_date,
            expiry_date: row.expiry_date,
            unit_cost: parse_decimal("unit_cost", &row.unit_cost)?,
            initial_quantity: parse_decimal("initial_quantity", &row.initial_quantity)?,
            remaining: parse_decimal("remaining", &row.remaining)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Input for receiving stock
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeInput {
    pub sku: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub expiry_date: NaiveDate,
    /// Defaults to today (UTC)
    pub intake_date: Option<NaiveDate>,
    /// Product details, required when the SKU is new
    pub name: Option<String>,
    pub sale_price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub category: Option<ProductCategory>,
    pub unit_of_measure: Option<String>,
}

/// Active batches of a product in FIFO order
pub(crate) async fn load_active_batches(
    conn: &mut SqliteConnection,
    product_id: Uuid,
) -> AppResult<Vec<Batch>> {
    let rows = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {} FROM batches WHERE product_id = ? AND deleted_at IS NULL ORDER BY intake_date, seq",
        BATCH_COLUMNS
    ))
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut batches = Vec::with_capacity(rows.len());
    for row in rows {
        let batch = Batch::try_from(row)?;
        if batch.is_active() {
            batches.push(batch);
        }
    }
    Ok(batches)
}

/// A single batch that is still part of the ledger
pub(crate) async fn load_live_batch(
    conn: &mut SqliteConnection,
    batch_id: Uuid,
) -> AppResult<Option<Batch>> {
    let row = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {} FROM batches WHERE id = ? AND deleted_at IS NULL",
        BATCH_COLUMNS
    ))
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let batch = Batch::try_from(row)?;
            Ok(batch.is_active().then_some(batch))
        }
        None => Ok(None),
    }
}

/// Write one planned allocation; an exhausted batch leaves the ledger
async fn apply_allocation(
    conn: &mut SqliteConnection,
    allocation: &Allocation,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let result = if allocation.exhausts_batch() {
        sqlx::query(
            "UPDATE batches SET remaining = '0', deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(allocation.batch_id)
        .execute(&mut *conn)
        .await?
    } else {
        sqlx::query(
            "UPDATE batches SET remaining = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(decimal_text(allocation.remaining_after))
        .bind(now)
        .bind(allocation.batch_id)
        .execute(&mut *conn)
        .await?
    };

    if result.rows_affected() != 1 {
        return Err(AppError::Internal(format!(
            "batch {} changed while being consumed",
            allocation.batch_id
        )));
    }
    Ok(())
}

/// Consume `quantity` of a product across its batches, oldest intake first.
///
/// Nothing is written when active stock cannot cover the request.
pub(crate) async fn apply_fifo(
    conn: &mut SqliteConnection,
    product_id: Uuid,
    quantity: Decimal,
    now: DateTime<Utc>,
) -> AppResult<Vec<Consumption>> {
    let batches = load_active_batches(conn, product_id).await?;
    let levels: Vec<BatchLevel> = batches.iter().map(BatchLevel::from).collect();

    let plan = plan_fifo(&levels, quantity)?;
    tracing::debug!(
        product_id = %product_id,
        quantity = %quantity,
        batches = plan.len(),
        "FIFO plan computed"
    );

    let mut consumed = Vec::with_capacity(plan.len());
    for allocation in &plan {
        apply_allocation(conn, allocation, now).await?;
        consumed.push(Consumption {
            batch_id: allocation.batch_id,
            product_id,
            taken: allocation.taken,
            remaining_after: allocation.remaining_after,
        });
    }
    Ok(consumed)
}

/// Take `quantity` out of one batch
pub(crate) async fn apply_batch_take(
    conn: &mut SqliteConnection,
    batch_id: Uuid,
    quantity: Decimal,
    now: DateTime<Utc>,
) -> AppResult<Consumption> {
    ensure_quantity(quantity)?;
    let batch = load_live_batch(conn, batch_id)
        .await?
        .ok_or(AppError::BatchNotFound(batch_id))?;

    let allocation = plan_batch_take(&BatchLevel::from(&batch), quantity)?;
    apply_allocation(conn, &allocation, now).await?;

    Ok(Consumption {
        batch_id,
        product_id: batch.product_id,
        taken: allocation.taken,
        remaining_after: allocation.remaining_after,
    })
}

/// Batch ledger service
#[derive(Clone)]
pub struct BatchLedger {
    store: Store,
}

impl BatchLedger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Receive a new batch, creating the product on its first intake
    pub async fn intake(&self, input: IntakeInput) -> AppResult<IntakeReceipt> {
        let sku = normalize_sku(&input.sku);
        validate_sku(&sku)
            .map_err(|m| AppError::validation("sku", m, "El SKU no tiene un formato válido"))?;
        ensure_quantity(input.quantity)?;
        validate_unit_cost(input.unit_cost).map_err(|m| {
            AppError::validation(
                "unit_cost",
                m,
                "El costo unitario debe estar entre 0 y 1000000000000",
            )
        })?;

        let now = Utc::now();
        let intake_date = input.intake_date.unwrap_or_else(|| now.date_naive());
        if input.expiry_date < intake_date {
            return Err(AppError::validation(
                "expiry_date",
                "Expiry date must not be before the intake date",
                "La fecha de vencimiento no puede ser anterior a la fecha de ingreso",
            ));
        }

        let mut tx = self.store.begin_write().await?;

        let (product_id, product_created) = match find_live_by_sku(tx.conn(), &sku).await? {
            Some(product) => (product.id, false),
            None => {
                let product = new_product(&sku, &input, now)?;
                insert_product(tx.conn(), &product).await?;
                tracing::info!(product_id = %product.id, sku = %sku, "Product created on intake");
                (product.id, true)
            }
        };

        let batch_id = Uuid::new_v4();
        let quantity = decimal_text(input.quantity);
        sqlx::query(
            r#"
            INSERT INTO batches (
                id, product_id, intake_date, expiry_date, unit_cost,
                initial_quantity, remaining, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(batch_id)
        .bind(product_id)
        .bind(intake_date)
        .bind(input.expiry_date)
        .bind(decimal_text(input.unit_cost))
        .bind(&quantity)
        .bind(&quantity)
        .bind(now)
        .bind(now)
        .execute(tx.conn())
        .await?;

        tx.commit().await?;
        tracing::info!(
            batch_id = %batch_id,
            sku = %sku,
            quantity = %input.quantity,
            intake_date = %intake_date,
            "Batch received"
        );

        Ok(IntakeReceipt {
            batch_id,
            product_id,
            product_created,
        })
    }

    /// Active batches of a product in consumption order
    pub async fn active_batches(&self, product_id: Uuid) -> AppResult<Vec<Batch>> {
        let mut conn = self.store.pool().acquire().await?;
        if find_live_by_id(&mut conn, product_id).await?.is_none() {
            return Err(AppError::NotFound("Product".to_string()));
        }
        load_active_batches(&mut conn, product_id).await
    }

    pub async fn active_batches_by_sku(&self, sku: &str) -> AppResult<Vec<Batch>> {
        let sku = normalize_sku(sku);
        let mut conn = self.store.pool().acquire().await?;
        let product = find_live_by_sku(&mut conn, &sku)
            .await?
            .ok_or(AppError::ProductNotFound(sku))?;
        load_active_batches(&mut conn, product.id).await
    }

    /// Consume stock FIFO-wise without recording a sale or loss
    pub async fn consume_fifo(
        &self,
        product_id: Uuid,
        quantity: Decimal,
    ) -> AppResult<Vec<Consumption>> {
        ensure_quantity(quantity)?;
        let mut tx = self.store.begin_write().await?;
        if find_live_by_id(tx.conn(), product_id).await?.is_none() {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let consumed = match apply_fifo(tx.conn(), product_id, quantity, Utc::now()).await {
            Ok(consumed) => consumed,
            Err(err) => {
                tracing::warn!(product_id = %product_id, quantity = %quantity, "FIFO consumption rejected: {}", err);
                return Err(err);
            }
        };

        tx.commit().await?;
        tracing::info!(
            product_id = %product_id,
            quantity = %quantity,
            batches = consumed.len(),
            "Stock consumed"
        );
        Ok(consumed)
    }

    /// Take stock out of one specific batch
    pub async fn consume_from_batch(
        &self,
        batch_id: Uuid,
        quantity: Decimal,
    ) -> AppResult<Consumption> {
        let mut tx = self.store.begin_write().await?;
        let consumed = apply_batch_take(tx.conn(), batch_id, quantity, Utc::now()).await?;
        tx.commit().await?;

        tracing::info!(
            batch_id = %batch_id,
            taken = %consumed.taken,
            remaining = %consumed.remaining_after,
            "Batch adjusted"
        );
        Ok(consumed)
    }
}

/// Build the product record for a first intake
fn new_product(sku: &str, input: &IntakeInput, now: DateTime<Utc>) -> AppResult<Product> {
    let name = input.name.as_deref().map(str::trim).unwrap_or_default();
    validate_product_name(name).map_err(|m| {
        AppError::validation(
            "name",
            m,
            "Se requiere el nombre del producto para un SKU nuevo",
        )
    })?;

    let sale_price = input.sale_price.ok_or_else(|| {
        AppError::validation(
            "sale_price",
            "Sale price is required for a new SKU",
            "Se requiere el precio de venta para un SKU nuevo",
        )
    })?;
    validate_sale_price(sale_price).map_err(|m| {
        AppError::validation(
            "sale_price",
            m,
            "El precio de venta debe ser mayor que cero y no superar 1000000000000",
        )
    })?;

    if let Some(min) = input.min_stock {
        validate_min_stock(min).map_err(|m| {
            AppError::validation("min_stock", m, "El stock mínimo debe estar entre 0 y 1000000000")
        })?;
    }

    let unit_of_measure = input
        .unit_of_measure
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_UNIT_OF_MEASURE);

    Ok(Product {
        id: Uuid::new_v4(),
        sku: sku.to_string(),
        name: name.to_string(),
        unit_of_measure: unit_of_measure.to_string(),
        sale_price,
        min_stock: input.min_stock,
        category: input.category,
        created_at: now,
        updated_at: now,
    })
}
