//! Loss processing: write-offs from a single batch or FIFO across batches

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::db::{decimal_text, parse_decimal, Store};
use crate::error::{AppError, AppResult};
use crate::services::ledger::{apply_batch_take, apply_fifo};
use crate::services::products::find_live_by_sku;
use shared::{
    checked_add, ensure_quantity, normalize_note, normalize_sku, Consumption, DateRange, Loss, LossReason,
    WriteOffSummary,
};

/// Input for writing off part of one batch
#[derive(Debug, Clone, Deserialize)]
pub struct WriteOffBatchInput {
    pub quantity: Decimal,
    pub reason: LossReason,
    pub note: Option<String>,
}

/// Input for a FIFO write-off of a product
#[derive(Debug, Clone, Deserialize)]
pub struct WriteOffFifoInput {
    pub sku: String,
    pub quantity: Decimal,
    pub reason: LossReason,
    pub note: Option<String>,
}

#[derive(Debug, FromRow)]
struct LossRow {
    id: Uuid,
    batch_id: Uuid,
    product_id: Uuid,
    reason: String,
    quantity: String,
    note: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<LossRow> for Loss {
    type Error = AppError;

    fn try_from(row: LossRow) -> AppResult<Self> {
        Ok(Loss {
            id: row.id,
            batch_id: row.batch_id,
            product_id: row.product_id,
            reason: row.reason.parse().map_err(AppError::Internal)?,
            quantity: parse_decimal("quantity", &row.quantity)?,
            note: row.note,
            recorded_at: row.recorded_at,
        })
    }
}

/// Record the loss for one consumed batch
async fn insert_loss(
    conn: &mut SqliteConnection,
    consumed: &Consumption,
    reason: LossReason,
    note: Option<String>,
    recorded_at: DateTime<Utc>,
) -> AppResult<Loss> {
    let loss = Loss {
        id: Uuid::new_v4(),
        batch_id: consumed.batch_id,
        product_id: consumed.product_id,
        reason,
        quantity: consumed.taken,
        note,
        recorded_at,
    };

    sqlx::query(
        r#"
        INSERT INTO losses (id, batch_id, product_id, reason, quantity, note, recorded_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(loss.id)
    .bind(loss.batch_id)
    .bind(loss.product_id)
    .bind(loss.reason.as_str())
    .bind(decimal_text(loss.quantity))
    .bind(loss.note.as_deref())
    .bind(loss.recorded_at)
    .execute(&mut *conn)
    .await?;

    Ok(loss)
}

/// Loss service
#[derive(Clone)]
pub struct LossService {
    store: Store,
    max_note_length: usize,
}

impl LossService {
    pub fn new(store: Store, max_note_length: usize) -> Self {
        Self {
            store,
            max_note_length,
        }
    }

    /// Write off `quantity` from one batch
    pub async fn write_off_batch(
        &self,
        batch_id: Uuid,
        quantity: Decimal,
        reason: LossReason,
        note: Option<&str>,
    ) -> AppResult<Loss> {
        let note = normalize_note(note, self.max_note_length);
        let recorded_at = Utc::now();

        let mut tx = self.store.begin_write().await?;
        let consumed = match apply_batch_take(tx.conn(), batch_id, quantity, recorded_at).await {
            Ok(consumed) => consumed,
            Err(err) => {
                tracing::warn!(batch_id = %batch_id, quantity = %quantity, "Write-off rejected: {}", err);
                return Err(err);
            }
        };
        let loss = insert_loss(tx.conn(), &consumed, reason, note, recorded_at).await?;
        tx.commit().await?;

        tracing::info!(
            loss_id = %loss.id,
            batch_id = %batch_id,
            quantity = %quantity,
            reason = reason.as_str(),
            exhausted = consumed.remaining_after.is_zero(),
            "Loss recorded"
        );
        Ok(loss)
    }

    /// Write off `quantity` of a product, oldest batches first
    pub async fn write_off_fifo(
        &self,
        sku: &str,
        quantity: Decimal,
        reason: LossReason,
        note: Option<&str>,
    ) -> AppResult<WriteOffSummary> {
        ensure_quantity(quantity)?;
        let sku = normalize_sku(sku);
        let note = normalize_note(note, self.max_note_length);
        let recorded_at = Utc::now();

        let mut tx = self.store.begin_write().await?;
        let product = find_live_by_sku(tx.conn(), &sku)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(sku.clone()))?;

        let consumed = match apply_fifo(tx.conn(), product.id, quantity, recorded_at).await {
            Ok(consumed) => consumed,
            Err(err) => {
                tracing::warn!(sku = %sku, quantity = %quantity, "Write-off rejected: {}", err);
                return Err(err);
            }
        };

        let mut loss_ids = Vec::with_capacity(consumed.len());
        let mut total_removed = Decimal::ZERO;
        for c in &consumed {
            let loss = insert_loss(tx.conn(), c, reason, note.clone(), recorded_at).await?;
            total_removed = checked_add(total_removed, loss.quantity, "write-off total")?;
            loss_ids.push(loss.id);
        }
        tx.commit().await?;

        tracing::info!(
            sku = %sku,
            quantity = %quantity,
            reason = reason.as_str(),
            losses = loss_ids.len(),
            "FIFO write-off recorded"
        );
        Ok(WriteOffSummary {
            loss_ids,
            total_removed,
        })
    }

    /// Losses recorded on one UTC day, oldest first
    pub async fn losses_on(&self, date: NaiveDate) -> AppResult<Vec<Loss>> {
        let (from, until) = DateRange::single_day(date).utc_bounds();
        let rows = sqlx::query_as::<_, LossRow>(
            r#"
            SELECT id, batch_id, product_id, reason, quantity, note, recorded_at
            FROM losses
            WHERE recorded_at >= ? AND recorded_at < ?
            ORDER BY recorded_at
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(self.store.pool())
        .await?;

        rows.into_iter().map(Loss::try_from).collect()
    }
}
