//! HTTP handlers for stock intake and batch queues

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ledger::{BatchLedger, IntakeInput};
use crate::AppState;
use shared::{Batch, IntakeReceipt};

/// Receive a new batch
pub async fn intake(
    State(state): State<AppState>,
    Json(input): Json<IntakeInput>,
) -> AppResult<(StatusCode, Json<IntakeReceipt>)> {
    let ledger = BatchLedger::new(state.db);
    let receipt = ledger.intake(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Active batches of a product in FIFO order
pub async fn active_batches(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<Batch>>> {
    let ledger = BatchLedger::new(state.db);
    let batches = ledger.active_batches(product_id).await?;
    Ok(Json(batches))
}
