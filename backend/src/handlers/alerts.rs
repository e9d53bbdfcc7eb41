//! HTTP handlers for stock alerts

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::alerts::StockAlertService;
use crate::AppState;
use shared::CriticalProduct;

fn service(state: &AppState) -> StockAlertService {
    StockAlertService::new(state.db.clone(), state.config.ledger.default_min_stock)
}

/// Products with positive stock under their minimum
pub async fn critical_products(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CriticalProduct>>> {
    let products = service(&state).critical_products().await?;
    Ok(Json(products))
}

pub async fn out_of_stock_products(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CriticalProduct>>> {
    let products = service(&state).out_of_stock_products().await?;
    Ok(Json(products))
}
