//! Route definitions for the FreshControl API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/inventory", inventory_routes())
        .nest("/products", product_routes())
        .nest("/sales", sale_routes())
        .nest("/losses", loss_routes())
        .nest("/alerts", alert_routes())
        .nest("/reports", report_routes())
}

/// Stock intake
fn inventory_routes() -> Router<AppState> {
    Router::new().route("/intake", post(handlers::intake))
}

/// Product catalogue and batch queues
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products))
        .route("/sku/:sku", get(handlers::get_product_by_sku))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/batches", get(handlers::active_batches))
}

fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::sell))
        .route("/:sale_id", get(handlers::get_sale))
}

/// Write-offs
fn loss_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_losses))
        .route("/batch/:batch_id", post(handlers::write_off_batch))
        .route("/fifo", post(handlers::write_off_fifo))
}

fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/critical", get(handlers::critical_products))
        .route("/out-of-stock", get(handlers::out_of_stock_products))
}

/// Read-side reports
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/valuation", get(handlers::get_valuation))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/sales", get(handlers::get_sales_report))
        .route("/losses", get(handlers::get_loss_report))
}
