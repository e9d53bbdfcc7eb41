//! Liveness and store reachability

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the ledger store answers, `degraded` otherwise
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub checked_at: DateTime<Utc>,
}

/// Reports 503 while the ledger store cannot be reached
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "ok", "connected"),
        Err(err) => {
            tracing::warn!("Ledger store unreachable: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
            checked_at: Utc::now(),
        }),
    )
}
