//! HTTP handlers for write-offs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::sales::DayQuery;
use crate::services::losses::{LossService, WriteOffBatchInput, WriteOffFifoInput};
use crate::AppState;
use shared::{Loss, WriteOffSummary};

fn service(state: &AppState) -> LossService {
    LossService::new(state.db.clone(), state.config.ledger.max_note_length)
}

/// Write off part or all of one batch
pub async fn write_off_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<WriteOffBatchInput>,
) -> AppResult<(StatusCode, Json<Loss>)> {
    let loss = service(&state)
        .write_off_batch(batch_id, input.quantity, input.reason, input.note.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(loss)))
}

/// Write off stock of a product, oldest batches first
pub async fn write_off_fifo(
    State(state): State<AppState>,
    Json(input): Json<WriteOffFifoInput>,
) -> AppResult<(StatusCode, Json<WriteOffSummary>)> {
    let summary = service(&state)
        .write_off_fifo(&input.sku, input.quantity, input.reason, input.note.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Losses recorded on a day
pub async fn list_losses(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<Loss>>> {
    let losses = service(&state).losses_on(query.day()).await?;
    Ok(Json(losses))
}
