//! Reporting handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::sales::DayQuery;
use crate::services::reporting::ReportingService;
use crate::AppState;
use shared::{DashboardKpis, DateRange, InventoryValuation, LossReport, SalesReport};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportQuery {
    /// Missing bounds default to today
    fn range(&self) -> AppResult<DateRange> {
        let today = Utc::now().date_naive();
        let end = self.end_date.unwrap_or(today);
        let start = self.start_date.unwrap_or(end);
        DateRange::new(start, end).map_err(|m| {
            AppError::validation(
                "end_date",
                m,
                "La fecha final no puede ser anterior a la fecha inicial",
            )
        })
    }
}

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(state.db.clone(), state.config.ledger.default_min_stock)
}

/// Purchase value of active stock
pub async fn get_valuation(State(state): State<AppState>) -> AppResult<Json<InventoryValuation>> {
    let valuation = service(&state).inventory_valuation().await?;
    Ok(Json(valuation))
}

/// Dashboard figures for a day
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<DashboardKpis>> {
    let kpis = service(&state).dashboard(query.day()).await?;
    Ok(Json(kpis))
}

pub async fn get_sales_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<SalesReport>> {
    let report = service(&state).sales_report(query.range()?).await?;
    Ok(Json(report))
}

pub async fn get_loss_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<LossReport>> {
    let report = service(&state).loss_report(query.range()?).await?;
    Ok(Json(report))
}
