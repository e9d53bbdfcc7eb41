//! WebAssembly module for FreshControl
//!
//! Lets the offline browser client run the ledger rules locally:
//! - FIFO breakdown preview before a sale or write-off
//! - Critical-stock classification
//! - Sale line subtotals
//!
//! Quantities and prices cross the boundary as decimal strings so the
//! browser sees exactly the figures the server would compute.

use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::fifo::{Allocation, BatchLevel};
pub use shared::models::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("freshcontrol-wasm ready"));
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|e| format!("Invalid {}: {}", field, e))
}

/// FIFO breakdown of `quantity` over batches given as a JSON array of
/// `{batch_id, intake_date, seq, remaining}`.
pub fn plan_fifo_json(batches_json: &str, quantity: &str) -> Result<String, String> {
    let levels: Vec<BatchLevel> =
        serde_json::from_str(batches_json).map_err(|e| format!("Invalid batches JSON: {}", e))?;
    let quantity = parse_decimal("quantity", quantity)?;

    let plan = shared::plan_fifo(&levels, quantity).map_err(|e| e.to_string())?;
    serde_json::to_string(&plan).map_err(|e| e.to_string())
}

pub fn stock_status_of(total: &str, min: &str) -> Result<StockStatus, String> {
    Ok(StockStatus::classify(
        parse_decimal("total", total)?,
        parse_decimal("min", min)?,
    ))
}

pub fn subtotal_of(quantity: &str, unit_price: &str) -> Result<String, String> {
    let subtotal = shared::line_subtotal(
        parse_decimal("quantity", quantity)?,
        parse_decimal("unit_price", unit_price)?,
    )
    .map_err(|e| e.to_string())?;
    Ok(subtotal.normalize().to_string())
}

/// Preview which batches a sale or write-off would consume
#[wasm_bindgen]
pub fn preview_fifo(batches_json: &str, quantity: &str) -> Result<String, JsValue> {
    plan_fifo_json(batches_json, quantity).map_err(|e| JsValue::from_str(&e))
}

/// Whether positive stock is below the minimum
#[wasm_bindgen]
pub fn is_critical_stock(total: &str, min: &str) -> Result<bool, JsValue> {
    stock_status_of(total, min)
        .map(|s| s == StockStatus::Critical)
        .map_err(|e| JsValue::from_str(&e))
}

/// Stock status as `out_of_stock`, `critical` or `healthy`
#[wasm_bindgen]
pub fn stock_status(total: &str, min: &str) -> Result<String, JsValue> {
    let status = stock_status_of(total, min).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| JsValue::from_str("unserializable status"))
}

/// Subtotal of a sale line
#[wasm_bindgen]
pub fn line_subtotal(quantity: &str, unit_price: &str) -> Result<String, JsValue> {
    subtotal_of(quantity, unit_price).map_err(|e| JsValue::from_str(&e))
}

/// Normalize and validate a SKU typed at the counter
#[wasm_bindgen]
pub fn check_sku(sku: &str) -> Result<String, JsValue> {
    let sku = normalize_sku(sku);
    validate_sku(&sku).map_err(JsValue::from_str)?;
    Ok(sku)
}
