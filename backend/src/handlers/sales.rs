//! HTTP handlers for sales

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::sales::{SaleService, SellInput};
use crate::AppState;
use shared::{Sale, SaleSummary, SaleWithItems};

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// Defaults to today (UTC)
    pub date: Option<NaiveDate>,
}

impl DayQuery {
    pub fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Sell a quantity of one product
pub async fn sell(
    State(state): State<AppState>,
    Json(input): Json<SellInput>,
) -> AppResult<(StatusCode, Json<SaleSummary>)> {
    let service = SaleService::new(state.db);
    let summary = service.sell(&input.sku, input.quantity).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SaleService::new(state.db);
    let sale = service.get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// Sales made on a day
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<Sale>>> {
    let service = SaleService::new(state.db);
    let sales = service.sales_on(query.day()).await?;
    Ok(Json(sales))
}
